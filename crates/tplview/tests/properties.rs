//! Property and concurrency tests for composed rendering.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use tplview::{context, Engine, MemoryLoader, ViewConfig};

fn site() -> MemoryLoader {
    let mut loader = MemoryLoader::new()
        .with(
            "layouts/master",
            "<html>{% include \"partials/nav\" %}{% include \"content\" %}</html>",
        )
        .with("partials/nav", "<nav>{{ user }}</nav>")
        .with("partials/item", "<li>{{ user }}:{{ n }}</li>");
    for i in 0..8 {
        loader.add(
            format!("page{}", i),
            format!(
                "<h1>page {} for {{{{ user }}}}</h1>{{{{ include(\"partials/item\") }}}}",
                i
            ),
        );
    }
    loader
}

fn config() -> ViewConfig {
    ViewConfig::default().with_partials(["partials/nav"])
}

// Strategy for data that templates interpolate
fn user_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 <>&\"']{0,24}"
}

fn name_strategy() -> impl Strategy<Value = String> {
    (0..8usize, any::<bool>()).prop_map(|(i, standalone)| {
        if standalone {
            format!("page{}.html", i)
        } else {
            format!("page{}", i)
        }
    })
}

proptest! {
    #[test]
    fn uncached_composition_is_deterministic(
        name in name_strategy(),
        user in user_strategy(),
        n in any::<i64>(),
    ) {
        let engine = Engine::with_loader(config().with_disable_cache(true), site());
        let data = context! { user => user, n => n };

        let first = engine.render_to_string(&name, &data).unwrap();
        let second = engine.render_to_string(&name, &data).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn cached_and_uncached_renders_agree(
        names in prop::collection::vec(name_strategy(), 1..16),
        user in user_strategy(),
    ) {
        let cached = Engine::with_loader(config(), site());
        let uncached = Engine::with_loader(config().with_disable_cache(true), site());

        for (n, name) in names.iter().enumerate() {
            let data = context! { user => user.clone(), n => n };
            prop_assert_eq!(
                cached.render_to_string(name, &data).unwrap(),
                uncached.render_to_string(name, &data).unwrap()
            );
        }
        prop_assert_eq!(uncached.cached_templates(), 0);
    }
}

#[test]
fn concurrent_renders_match_sequential_baseline() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 25;

    let names: Vec<String> = (0..8)
        .flat_map(|i| [format!("page{}", i), format!("page{}.html", i)])
        .collect();

    let baseline_engine = Engine::with_loader(config().with_disable_cache(true), site());
    let baseline: BTreeMap<(String, usize), String> = (0..THREADS)
        .flat_map(|t| names.iter().map(move |name| (name.clone(), t)))
        .map(|(name, t)| {
            let out = baseline_engine
                .render_to_string(&name, &context! { user => format!("u{}", t), n => t })
                .unwrap();
            ((name, t), out)
        })
        .collect();
    let baseline = Arc::new(baseline);

    let engine = Engine::with_loader(config(), site());
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = engine.clone();
            let names = names.clone();
            let baseline = baseline.clone();
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    // Each thread walks the names from a different offset
                    for i in 0..names.len() {
                        let name = &names[(i + t + round) % names.len()];
                        let out = engine
                            .render_to_string(name, &context! { user => format!("u{}", t), n => t })
                            .unwrap();
                        assert_eq!(&out, &baseline[&(name.clone(), t)], "{} on thread {}", name, t);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // One namespace per content name, plus the include target
    assert_eq!(engine.cached_templates(), 9);
}
