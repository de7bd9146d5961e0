//! Plain-text rendering of states and tick reports.

use std::fmt::Write;

use tickcraft_core::event::{TickEvent, TickReport};
use tickcraft_core::state::State;

pub fn describe(state: &State) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tick {}", state.tick());

    let _ = writeln!(out, "\nInventory:");
    if state.inventory().is_empty() {
        let _ = writeln!(out, "  (empty)");
    }
    for (item, count) in state.inventory().iter() {
        let _ = writeln!(out, "  {:<20} {:>6}", item.to_string(), count);
    }

    out.push('\n');
    out.push_str(&describe_queue(state));

    let _ = writeln!(out, "\nRobots:");
    if state.robot_count() == 0 {
        let _ = writeln!(out, "  (none)");
    }
    for robot in state.robots() {
        let doing = match &robot.action {
            Some(action) => format!("{action} [{}/{}]", action.progress(), action.target()),
            None => "idle".to_string(),
        };
        let _ = writeln!(out, "  #{} {}: {}", robot.id, robot.name, doing);
        for (i, rule) in robot.algorithm.iter().enumerate() {
            let _ = writeln!(out, "      {i}. {rule}");
        }
    }
    out
}

pub fn describe_queue(state: &State) -> String {
    let mut out = String::from("Queue:\n");
    if state.queue().is_empty() {
        out.push_str("  (empty)\n");
    }
    for (i, action) in state.queue().iter().enumerate() {
        let _ = writeln!(
            out,
            "  {i}. {action} [{}/{}]",
            action.progress(),
            action.target()
        );
    }
    out
}

/// One line per action completed during `report`'s tick.
pub fn completions(report: &TickReport) -> Vec<String> {
    report
        .events
        .iter()
        .filter_map(|event| match event {
            TickEvent::ActionCompleted { actor, kind, item } => {
                Some(format!("tick {}: {actor} finished {kind:?} {item}", report.tick))
            }
            _ => None,
        })
        .collect()
}
