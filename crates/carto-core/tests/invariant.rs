//! Random operation sequences never break effective visibility.

mod common;

use std::collections::BTreeSet;

use carto_core::{FetchError, LoadOutcome};
use carto_model::Category;
use common::{Harness, id, rows_for};
use proptest::prelude::*;

const IDS: [&str; 5] = ["a", "b", "c", "d", "e"];

#[derive(Debug, Clone)]
enum Op {
    Master(Category, bool),
    Override(Category, usize, bool),
    Load(Category, Vec<usize>),
    FailLoad(Category),
    LoadAll(Vec<usize>),
    Teardown,
}

fn category() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

fn subset() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::btree_set(0..IDS.len(), 0..=IDS.len())
        .prop_map(|set| set.into_iter().collect())
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (category(), any::<bool>()).prop_map(|(c, v)| Op::Master(c, v)),
        4 => (category(), 0..IDS.len(), any::<bool>()).prop_map(|(c, i, v)| Op::Override(c, i, v)),
        3 => (category(), subset()).prop_map(|(c, ids)| Op::Load(c, ids)),
        2 => category().prop_map(Op::FailLoad),
        1 => subset().prop_map(Op::LoadAll),
        1 => Just(Op::Teardown),
    ]
}

/// What the visible state should be, tracked independently.
struct Model {
    masters: [bool; 4],
    loaded: [Vec<usize>; 4],
    hidden: [BTreeSet<usize>; 4],
}

impl Model {
    fn load(&mut self, category: Category, ids: &[usize]) {
        let i = category.index();
        self.loaded[i] = ids.to_vec();
        self.hidden[i].retain(|id| ids.contains(id));
    }
}

fn names(ids: &[usize]) -> Vec<&'static str> {
    ids.iter().map(|&i| IDS[i]).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn attached_matches_master_and_override(ops in prop::collection::vec(op(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let h = Harness::new();
        let mut model = Model {
            masters: [true; 4],
            loaded: Default::default(),
            hidden: Default::default(),
        };

        for op in ops {
            match op {
                Op::Master(c, visible) => {
                    h.context.toggle_master(c, visible);
                    model.masters[c.index()] = visible;
                }
                Op::Override(c, i, visible) => {
                    let result = h.context.toggle_override(c, &id(IDS[i]), visible);
                    let allowed = c.is_compound() && model.loaded[c.index()].contains(&i);
                    prop_assert_eq!(result.is_ok(), allowed);
                    if allowed {
                        if visible {
                            model.hidden[c.index()].remove(&i);
                        } else {
                            model.hidden[c.index()].insert(i);
                        }
                    }
                }
                Op::Load(c, ids) => {
                    h.source.standing(c, rows_for(c, &names(&ids)));
                    let outcome = runtime.block_on(h.pipeline.load_category(c));
                    prop_assert!(outcome.is_applied());
                    model.load(c, &ids);
                }
                Op::FailLoad(c) => {
                    h.source.fail(c, FetchError::Status {
                        status: 500,
                        message: "boom".to_string(),
                    });
                    let outcome = runtime.block_on(h.pipeline.load_category(c));
                    prop_assert!(matches!(outcome, LoadOutcome::Failed(_)), "{:?}", outcome);
                }
                Op::LoadAll(ids) => {
                    for c in Category::ALL {
                        h.source.standing(c, rows_for(c, &names(&ids)));
                    }
                    let report = runtime.block_on(h.pipeline.load_all());
                    prop_assert_eq!(report.applied_count(), 4);
                    model.masters = [true; 4];
                    for c in Category::ALL {
                        model.load(c, &ids);
                    }
                }
                Op::Teardown => {
                    h.context.teardown();
                    model.masters = [false; 4];
                    model.loaded = Default::default();
                    model.hidden = Default::default();
                }
            }

            h.assert_consistent();
            for c in Category::ALL {
                let i = c.index();
                prop_assert_eq!(h.context.master(c), model.masters[i]);
                let expected: Vec<String> = model.loaded[i]
                    .iter()
                    .filter(|&&id| {
                        model.masters[i] && (!c.is_compound() || !model.hidden[i].contains(&id))
                    })
                    .map(|&id| IDS[id].to_string())
                    .collect();
                prop_assert_eq!(h.attached_ids(c), expected);
            }
        }
    }
}
