//! Property-Based Tests for NATTD
//!
//! Uses proptest to generate random selections from the built-in catalog
//! (optionally pinning Flatpak variants) and checks the generated scripts.
//!
//! These tests verify:
//! - Determinism of generation
//! - Section ordering and dependency soundness of rendered blocks
//! - Shared-action idempotence
//! - Quiet and verbose output differ only by redirects
//! - No placeholder survives assembly

use proptest::prelude::*;
use std::sync::OnceLock;

use nattd::engine::render::{ModeRenderer, QUIET_REDIRECT};
use nattd::engine::{ScriptGenerator, DEFAULT_HOSTNAME};
use nattd::logic::dedup::deduplicate;
use nattd::logic::resolver::{resolve, NodeRef};
use nattd::selection::SelectionSet;
use nattd::types::{RenderMode, Section};

fn generator() -> &'static ScriptGenerator {
    static GENERATOR: OnceLock<ScriptGenerator> = OnceLock::new();
    GENERATOR.get_or_init(|| ScriptGenerator::builtin().unwrap())
}

// =============================================================================
// Strategies
// =============================================================================

/// Random subset of catalog ids; when `flatpak` is set, options offering a
/// Flatpak variant are pinned to it.
fn selection_strategy() -> impl Strategy<Value = SelectionSet> {
    let options = generator().catalog().all_options();
    let ids: Vec<String> = options.iter().map(|o| o.id.clone()).collect();
    let len = ids.len();
    (proptest::sample::subsequence(ids, 0..=len), any::<bool>()).prop_map(|(ids, flatpak)| {
        let items: Vec<String> = ids
            .into_iter()
            .map(|id| {
                let has_flatpak = generator()
                    .catalog()
                    .lookup(&id)
                    .is_some_and(|o| o.variant("flatpak").is_some());
                if flatpak && has_flatpak {
                    format!("{}=flatpak", id)
                } else {
                    id
                }
            })
            .collect();
        SelectionSet::parse(&items).unwrap()
    })
}

fn mode_strategy() -> impl Strategy<Value = RenderMode> {
    prop_oneof![Just(RenderMode::Quiet), Just(RenderMode::Verbose)]
}

// =============================================================================
// Generation Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Same selection and mode always produce the same text
    #[test]
    fn generation_is_deterministic(selection in selection_strategy(), mode in mode_strategy()) {
        let first = generator().generate(&selection, mode).unwrap();
        let second = generator().generate(&selection, mode).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Every marker is replaced and nothing else of the template changes
    #[test]
    fn placeholders_fully_replaced(selection in selection_strategy(), mode in mode_strategy()) {
        let script = generator().generate(&selection, mode).unwrap();
        for section in Section::ordered() {
            prop_assert!(!script.contains(&section.placeholder()));
        }
        prop_assert!(script.starts_with("#!/bin/bash\n"));
    }

    /// Stripping the redirect token from quiet output yields verbose output
    #[test]
    fn modes_differ_only_by_redirect(selection in selection_strategy()) {
        let quiet = generator().generate(&selection, RenderMode::Quiet).unwrap();
        let verbose = generator().generate(&selection, RenderMode::Verbose).unwrap();
        prop_assert_eq!(quiet.replace(QUIET_REDIRECT, ""), verbose);
    }

    /// Each shared action's text is realized at most once
    #[test]
    fn shared_actions_realized_once(selection in selection_strategy(), mode in mode_strategy()) {
        let script = generator().generate(&selection, mode).unwrap();
        for action in generator().catalog().shared_actions() {
            let heading = format!("# {}\n", action.label);
            prop_assert!(script.matches(&heading).count() <= 1);
            for command in &action.commands {
                prop_assert!(script.matches(command.text.as_str()).count() <= 1);
            }
        }
    }

    /// Rendered blocks appear once each, in plan order
    #[test]
    fn blocks_appear_in_plan_order(selection in selection_strategy(), mode in mode_strategy()) {
        let catalog = generator().catalog();
        let script = generator().generate(&selection, mode).unwrap();
        let plan = deduplicate(resolve(catalog, &selection).unwrap());
        let renderer = ModeRenderer::new(mode, DEFAULT_HOSTNAME);

        let mut cursor = 0;
        for planned in &plan.nodes {
            let block = renderer.render_node(planned);
            if block.is_empty() {
                continue;
            }
            prop_assert_eq!(script.matches(block.as_str()).count(), 1);
            let offset = script[cursor..].find(block.as_str()).map(|i| i + cursor);
            prop_assert!(offset.is_some(), "{} out of order", planned.node.id());
            cursor = offset.unwrap_or(cursor) + block.len();
        }
    }
}

// =============================================================================
// Plan Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Plan sections never go backwards
    #[test]
    fn plan_sections_are_ordered(selection in selection_strategy()) {
        let plan = deduplicate(resolve(generator().catalog(), &selection).unwrap());
        let sections: Vec<Section> = plan.nodes.iter().map(|n| n.section).collect();
        let mut sorted = sections.clone();
        sorted.sort();
        prop_assert_eq!(sections, sorted);
    }

    /// Every requirement of a planned option is planned earlier, and every
    /// selected option is planned
    #[test]
    fn plan_is_dependency_sound(selection in selection_strategy()) {
        let plan = deduplicate(resolve(generator().catalog(), &selection).unwrap());
        let position = |id: &str| plan.nodes.iter().position(|n| n.node.id() == id);

        for chosen in selection.iter() {
            prop_assert!(position(&chosen.id).is_some());
        }
        for (i, planned) in plan.nodes.iter().enumerate() {
            if let NodeRef::Setup { option, variant } = planned.node {
                for requirement in option.requirements(variant) {
                    let before = position(requirement);
                    prop_assert!(
                        before.is_some_and(|p| p < i),
                        "{} must come after {}",
                        option.id,
                        requirement
                    );
                }
            }
        }
    }

    /// Each node is planned once
    #[test]
    fn plan_has_no_duplicates(selection in selection_strategy()) {
        let plan = deduplicate(resolve(generator().catalog(), &selection).unwrap());
        let mut ids: Vec<&str> = plan.nodes.iter().map(|n| n.node.id()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
    }
}
