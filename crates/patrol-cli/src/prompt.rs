//! Interactive budget decision on the terminal.

use std::future::Future;
use std::io::{self, BufRead, Write};

use patrol_core::{BudgetOverrun, Decision, DecisionResolver};
use tokio::sync::oneshot;

/// Asks the operator on stderr and reads one answer from stdin.
///
/// The read runs on a detached thread so an expired decision timeout does
/// not keep the process alive waiting for input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptResolver;

impl DecisionResolver for PromptResolver {
    fn decide(&self, overrun: &BudgetOverrun) -> impl Future<Output = Option<Decision>> + Send {
        let message = overrun.to_string();
        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            let _ = tx.send(ask(&message, io::stdin().lock(), io::stderr()));
        });
        async move { rx.await.ok().flatten() }
    }
}

fn ask(message: &str, mut input: impl BufRead, mut output: impl Write) -> Option<Decision> {
    let _ = writeln!(output, "{}", message);
    let _ = write!(
        output,
        "Keep safety priority [s] or limit to budget [d]? (anything else cancels): "
    );
    let _ = output.flush();

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => parse_answer(&line),
    }
}

/// Map an operator answer to a decision. Unknown answers decline.
pub fn parse_answer(line: &str) -> Option<Decision> {
    match line.trim().to_ascii_lowercase().as_str() {
        "s" | "y" | "yes" => Some(Decision::SafetyFirst),
        "d" | "n" | "no" => Some(Decision::DistanceLimited),
        other => other.parse().ok(),
    }
}
