//! AASM model sources read by the introspector

use std::fs;
use std::path::{Path, PathBuf};

use statecharts::plugins::AasmIntrospector;
use statecharts::{GuardRef, Introspector, ModelDescription};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn describe(name: &str) -> Vec<ModelDescription> {
    let path = fixture(name);
    let input = fs::read_to_string(&path).unwrap();
    AasmIntrospector::new().describe(&input, &path).unwrap()
}

#[test]
fn test_continued_transition_options() {
    let models = describe("app_models/claim.rb");
    assert_eq!(models.len(), 1);

    let machine = models[0].machine.as_ref().unwrap();
    let submit = &machine.events[0];
    assert_eq!(submit.name, "submit");
    assert_eq!(submit.transitions[0].guards, vec![GuardRef::named("accepting_claims?")]);
    assert_eq!(submit.transitions[0].after, vec!["notify_submitted"]);

    let submitted = machine.state("submitted").unwrap();
    assert_eq!(submitted.exit_callbacks, vec!["cancel_deadline", "close_ticket"]);
    assert!(machine.state("resolved").unwrap().is_final);
}

#[test]
fn test_multiple_from_states_expand() {
    let models = describe("app_models/git_hub.rb");
    let machine = models[0].machine.as_ref().unwrap();
    assert_eq!(machine.states.len(), 10);

    let close = machine
        .events
        .iter()
        .find(|e| e.name == "close_without_merging")
        .unwrap();
    assert_eq!(close.transitions.len(), 8);
    assert!(close.transitions.iter().all(|t| t.to == "closed"));
    assert_eq!(close.transitions[0].from, "opened");
    assert_eq!(close.transitions[7].from, "ready_to_merge");
}

#[test]
fn test_model_file_stem() {
    let models = describe("app_models/git_hub.rb");
    assert_eq!(models[0].name, "GitHub");
    assert_eq!(models[0].file_stem(), "git_hub");
}

#[test]
fn test_empty_event_and_methods_are_skipped() {
    let models = describe("no_rails_pivotal_tracker_feature.rb");
    let machine = models[0].machine.as_ref().unwrap();

    let deliver = machine
        .events
        .iter()
        .find(|e| e.name == "deliver_to_and_review_with_client")
        .unwrap();
    assert!(deliver.transitions.is_empty());

    let waiting = machine.state("waiting_for_client_review").unwrap();
    assert_eq!(waiting.enter_callbacks, vec!["press_FINISHED_button"]);
    assert_eq!(waiting.exit_callbacks, vec!["press_DELIVER_button"]);
}

#[test]
fn test_every_fixture_is_readable() {
    for name in [
        "single_state.rb",
        "no_rails_single_state.rb",
        "two_simple_states.rb",
        "many_states.rb",
        "no_rails_many_states.rb",
        "no_rails_claim.rb",
        "no_rails_pivotal_tracker_feature.rb",
        "shf/pivotal_tracker_feature.rb",
        "app_models/claim.rb",
        "app_models/git_hub.rb",
        "app_models/purchase.rb",
    ] {
        let models = describe(name);
        assert_eq!(models.len(), 1, "{}", name);
        assert!(models[0].has_state_machine(), "{}", name);
    }
}

#[test]
fn test_several_classes_in_one_file() {
    let source = "class A\n  include AASM\n  aasm do\n    state :x, initial: true\n  end\nend\n\nclass B\n  def run\n  end\nend\n";
    let models = AasmIntrospector::new()
        .describe(source, Path::new("models.rb"))
        .unwrap();
    assert_eq!(models.len(), 2);
    assert!(models[0].has_state_machine());
    assert_eq!(models[1].name, "B");
    assert!(!models[1].has_state_machine());
}

#[test]
fn test_multi_line_lambda_guard_line() {
    let source = "class Door\n  include AASM\n  aasm do\n    state :open, initial: true\n    state :closed\n    event :close do\n      transitions from: :open,\n                  to: :closed,\n                  guard: -> { empty? }\n    end\n  end\nend\n";
    let models = AasmIntrospector::new()
        .describe(source, Path::new("door.rb"))
        .unwrap();
    let machine = models[0].machine.as_ref().unwrap();
    assert_eq!(
        machine.events[0].transitions[0].guards,
        vec![GuardRef::source("door.rb", 9)]
    );
}
