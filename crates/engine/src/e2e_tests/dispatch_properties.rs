//! Parser and dispatcher properties checked from raw input.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::commands::{test_support, RollCommand};
use crate::infrastructure::clock::SystemRandom;
use crate::infrastructure::config::RunnerConfig;
use crate::parser::{self, FlagValue, ParseOptions};
use crate::runner::{CommandRunner, OutcomeTag};

#[test]
fn non_marker_input_is_passed_through_unchanged() {
    let options = ParseOptions::default();
    for input in [
        "",
        "hello there",
        "@Bob /attack",
        "--whisper hi",
        "what about /roll?",
        "\\/roll 1d6",
        "?/he",
    ] {
        let parsed = parser::parse(input, &options);
        assert!(!parsed.is_command, "{:?} parsed as a command", input);
        assert_eq!(parsed.original_text, input);
        assert!(parsed.command.is_none());
    }
}

#[test]
fn talk_line_splits_into_targets_text_and_flags() {
    let parsed = parser::parse(r#"/talk @Bob "hello there" --whisper"#, &ParseOptions::default());

    assert!(parsed.is_command);
    assert_eq!(parsed.command.as_deref(), Some("talk"));
    let args = parsed.args.unwrap();
    assert_eq!(args.targets, vec!["Bob"]);
    assert_eq!(args.plain_text, vec!["hello there"]);
    assert_eq!(args.flags.len(), 1);
    assert_eq!(args.flag("whisper"), Some(&FlagValue::Switch));
    assert_eq!(args.flag("whisper").unwrap().as_str(), "true");
}

#[tokio::test]
async fn unregistered_command_and_aliases_stop_resolving() {
    let t = test_support::table();
    let mut runner = runner_with_dice(&RunnerConfig::default(), 10);
    assert_eq!(
        dispatch(&mut runner, "/say hi", &t.ctx).await.outcome_tag,
        OutcomeTag::Success
    );

    assert!(runner.unregister("talk"));

    for input in ["/talk hi", "/say hi", "/t hi"] {
        let envelope = dispatch(&mut runner, input, &t.ctx).await;
        assert_eq!(envelope.outcome_tag, OutcomeTag::CommandNotFound, "{}", input);
    }
    assert!(runner.command_help("say").is_none());
}

#[tokio::test]
async fn typo_suggests_the_real_command() {
    let t = test_support::table();
    let mut runner = runner_with_dice(&RunnerConfig::default(), 10);

    let envelope = dispatch(&mut runner, "/atack @Bob", &t.ctx).await;

    assert_eq!(envelope.outcome_tag, OutcomeTag::CommandNotFound);
    assert!(!envelope.success);
    let suggestions = envelope.suggestions.unwrap();
    assert!(suggestions.contains(&"attack".to_string()));
    assert!(runner.history().is_empty());
}

#[tokio::test]
async fn combat_command_outside_combat_never_executes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut runner = CommandRunner::empty(&RunnerConfig::default(), test_support::clock());
    runner.register(Arc::new(CountingCombatCommand::new(calls.clone())));

    let mut ctx = test_support::table().ctx;
    ctx.environment.combat_active = false;
    for input in ["/rally", "/cheer", "/RALLY --loud"] {
        let envelope = dispatch(&mut runner, input, &ctx).await;
        assert_eq!(envelope.outcome_tag, OutcomeTag::PermissionDenied, "{}", input);
        assert_eq!(envelope.message, "This command can only be used during combat");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    ctx.environment.combat_active = true;
    let envelope = dispatch(&mut runner, "/rally", &ctx).await;
    assert_eq!(envelope.outcome_tag, OutcomeTag::Success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn history_drops_oldest_past_capacity() {
    let config = RunnerConfig {
        history_capacity: 3,
        ..RunnerConfig::default()
    };
    let mut runner = runner_with_dice(&config, 4);
    let ctx = bare_context();

    for n in 1..=4 {
        let envelope = dispatch(&mut runner, &format!("/roll d6 attempt {}", n), &ctx).await;
        assert_eq!(envelope.outcome_tag, OutcomeTag::Success);
        assert!(runner.history().len() <= 3);
    }

    let inputs: Vec<&str> = runner
        .history()
        .iter()
        .map(|record| record.result.original_input.as_str())
        .collect();
    assert_eq!(
        inputs,
        vec!["/roll d6 attempt 2", "/roll d6 attempt 3", "/roll d6 attempt 4"]
    );
}

#[tokio::test]
async fn unrecorded_dispatch_leaves_history_alone() {
    let mut runner = runner_with_dice(&RunnerConfig::default(), 4);
    let envelope = dispatch_unrecorded(&mut runner, "/roll", &bare_context()).await;
    assert_eq!(envelope.outcome_tag, OutcomeTag::Success);
    assert!(runner.history().is_empty());
}

#[test]
fn listing_is_sorted_and_stable() {
    let runner = runner_with_dice(&RunnerConfig::default(), 10);

    let first = runner.list_commands(None);
    let second = runner.list_commands(None);

    assert_eq!(first, second);
    let names: Vec<&str> = first.iter().map(|meta| meta.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["ai", "attack", "cast", "defend", "heal", "move", "roll", "talk"]
    );
}

#[tokio::test]
async fn lone_roll_command_stays_in_range() {
    let mut runner = CommandRunner::empty(&RunnerConfig::default(), test_support::clock());
    runner.register(Arc::new(RollCommand::new(
        test_support::clock(),
        Arc::new(SystemRandom::new()),
    )));
    let ctx = bare_context();

    for _ in 0..200 {
        let envelope = dispatch(&mut runner, "/roll 3d6+2", &ctx).await;
        assert_eq!(envelope.outcome_tag, OutcomeTag::Success);
        let total = envelope.data.as_ref().unwrap()["total"].as_i64().unwrap();
        assert!((5..=20).contains(&total), "total {} out of range", total);
    }
}

#[tokio::test]
async fn lone_roll_command_hits_both_extremes() {
    for (die, expected) in [(1, 5), (6, 20)] {
        let mut runner = CommandRunner::empty(&RunnerConfig::default(), test_support::clock());
        runner.register(Arc::new(RollCommand::new(
            test_support::clock(),
            test_support::random(die),
        )));

        let envelope = dispatch(&mut runner, "/roll 3d6+2", &bare_context()).await;
        assert_eq!(envelope.data.unwrap()["total"], expected);
    }
}

fn gm_in_combat() -> tabletalk_domain::ExecutionContext {
    test_support::table()
        .ctx
        .with_permissions(tabletalk_domain::Permissions::gm())
}

#[tokio::test]
async fn all_is_rejected_by_single_target_commands() {
    let ctx = gm_in_combat();
    let mut runner = runner_with_dice(&RunnerConfig::default(), 10);

    for (input, message) in [
        ("/attack @all", "Attack one target at a time"),
        ("/heal @all", "Heal one target at a time"),
        ("/ai @all on", "Change one character at a time"),
    ] {
        let envelope = dispatch(&mut runner, input, &ctx).await;
        assert_eq!(envelope.outcome_tag, OutcomeTag::ValidationError, "{}", input);
        assert_eq!(envelope.message, message);
    }
    assert!(runner.history().is_empty());
}

#[tokio::test]
async fn accepted_targets_always_execute() {
    let ctx = gm_in_combat();
    let mut runner = runner_with_dice(&RunnerConfig::default(), 10);
    let lines = ["/attack", "/heal", "/ai on", "/talk hi", "/cast spark", "/move Tavern"];
    let targets = ["@all", "@ALL", "@self", "@me", "@Bob", "@bob", "@Zed", "@Bob @all"];

    for line in lines {
        for target in targets {
            let input = format!("{} {}", line, target);
            let envelope = dispatch(&mut runner, &input, &ctx).await;
            assert_ne!(
                envelope.outcome_tag,
                OutcomeTag::ExecutionError,
                "{} passed validation but failed: {}",
                input,
                envelope.message
            );
        }
    }
}

#[tokio::test]
async fn oversized_numbers_fail_validation() {
    let ctx = gm_in_combat();
    let mut runner = runner_with_dice(&RunnerConfig::default(), 10);

    for input in [
        "/attack @Bob --bonus=2147483647",
        "/attack @Bob --damage=1d6+2147483647",
        "/heal @Bob --amount=2147483647",
        "/roll 1d20+2147483647",
        "/roll 1d20+-5",
        "/cast spark --damage=2d6+99999",
    ] {
        let envelope = dispatch(&mut runner, input, &ctx).await;
        assert_eq!(envelope.outcome_tag, OutcomeTag::ValidationError, "{}", input);
    }
}
