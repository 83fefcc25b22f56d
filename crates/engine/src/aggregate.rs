//! Report rendering and synthesis over a batch of agent results.

use std::fmt::Write;
use std::time::Duration;

use conclave_core::{CancellationToken, Capability, CapabilityError, Error, Phase, Result};
use tracing::{info, warn};

use crate::fanout::CANCEL_GRACE;
use crate::prompts;

/// `"Agent analyses:"` followed by one labelled paragraph per result.
pub fn render_report(results: &[String]) -> String {
    let mut report = String::from("Agent analyses:\n\n");
    for (i, result) in results.iter().enumerate() {
        let _ = write!(report, "Agent {}: {}\n\n", i + 1, result);
    }
    report
}

/// Fallback merge used when the synthesis capability is unavailable.
pub fn naive_concatenation(results: &[String]) -> String {
    let mut combined = String::from("Combined results:\n");
    for (i, result) in results.iter().enumerate() {
        let _ = write!(combined, "\nAgent {}:\n{}\n", i + 1, result);
    }
    combined
}

/// Ask `capability` to merge `results` into one conclusion.
///
/// `cancel` is handed to the capability as-is; bounding the call is up to
/// the caller.
pub async fn synthesize_with(
    capability: &dyn Capability,
    results: &[String],
    cancel: &CancellationToken,
) -> std::result::Result<String, CapabilityError> {
    let prompt = prompts::synthesis(results);
    capability.process(cancel, &prompt).await
}

/// The standard report followed by a consolidated conclusion.
///
/// A failed or timed-out synthesis never fails the run: the conclusion falls
/// back to plain concatenation and the error is appended as a diagnostic.
/// Only cancellation of `cancel` itself ends the run, with
/// [`Error::Cancelled`].
pub async fn report_with_synthesis(
    capability: &dyn Capability,
    results: &[String],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<String> {
    let phase = Phase::Synthesis;
    if cancel.is_cancelled() {
        return Err(Error::Cancelled { phase });
    }

    let token = cancel.child_token();
    let call = synthesize_with(capability, results, &token);
    tokio::pin!(call);

    let finished = tokio::select! {
        outcome = &mut call => Some(outcome),
        _ = cancel.cancelled() => None,
        _ = tokio::time::sleep(timeout) => None,
    };

    let outcome = match finished {
        Some(outcome) => outcome,
        None => {
            token.cancel();
            wind_down(call.as_mut()).await;
            Err(CapabilityError::Failed(format!(
                "no answer within {}s",
                timeout.as_secs()
            )))
        }
    };

    // Caller cancellation wins over whatever the capability returned.
    if cancel.is_cancelled() {
        return Err(Error::Cancelled { phase });
    }

    let mut report = render_report(results);
    match outcome {
        Ok(conclusion) => {
            info!(capability = %capability.name(), chars = conclusion.len(), "Synthesis complete");
            report.push_str("\nConsolidated conclusion (synthesis capability):\n");
            report.push_str(&conclusion);
        }
        Err(e) => {
            warn!(capability = %capability.name(), error = %e, "Synthesis failed; concatenating");
            report.push_str(
                "\nConsolidated conclusion (plain concatenation, synthesis capability failed):\n",
            );
            report.push_str(&naive_concatenation(results));
            let _ = write!(report, "\n\nSynthesis error: {e}");
        }
    }
    Ok(report)
}

/// Let a cancelled call return on its own, up to the fan-out grace period.
async fn wind_down<F: Future>(call: std::pin::Pin<&mut F>) {
    if tokio::time::timeout(CANCEL_GRACE, call).await.is_err() {
        warn!("Synthesis capability ignored cancellation; dropping the call");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::sync::Arc;

    fn results() -> Vec<String> {
        vec!["alpha".into(), "beta".into()]
    }

    #[test]
    fn report_labels_from_one() {
        assert_eq!(
            render_report(&results()),
            "Agent analyses:\n\nAgent 1: alpha\n\nAgent 2: beta\n\n"
        );
    }

    #[test]
    fn empty_report_is_just_the_heading() {
        assert_eq!(render_report(&[]), "Agent analyses:\n\n");
    }

    #[test]
    fn concatenation_format() {
        assert_eq!(
            naive_concatenation(&results()),
            "Combined results:\n\nAgent 1:\nalpha\n\nAgent 2:\nbeta\n"
        );
    }

    #[tokio::test]
    async fn synthesis_prompt_lists_every_result() {
        let cap = RecordingCapability::new("synth");
        let token = CancellationToken::new();
        let out = synthesize_with(&cap, &results(), &token).await.unwrap();
        assert!(out.starts_with("synth:"));
        let prompts = cap.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("=== AGENT 1 ===\nalpha"));
        assert!(prompts[0].contains("=== AGENT 2 ===\nbeta"));
    }

    #[tokio::test]
    async fn successful_synthesis_appends_conclusion() {
        let cap = DelayedCapability::new("synth", "merged view", Duration::from_millis(1));
        let token = CancellationToken::new();
        let report = report_with_synthesis(&cap, &results(), Duration::from_secs(5), &token)
            .await
            .unwrap();
        assert!(report.starts_with(&render_report(&results())));
        assert!(report.ends_with("\nConsolidated conclusion (synthesis capability):\nmerged view"));
    }

    #[tokio::test]
    async fn failed_synthesis_falls_back_with_diagnostic() {
        let cap = FailingCapability::new("synth");
        let token = CancellationToken::new();
        let report = report_with_synthesis(&cap, &results(), Duration::from_secs(5), &token)
            .await
            .unwrap();

        let expected = format!(
            "{}\nConsolidated conclusion (plain concatenation, synthesis capability failed):\n{}{}",
            render_report(&results()),
            naive_concatenation(&results()),
            "\n\nSynthesis error: ",
        );
        assert!(report.starts_with(&expected));
        assert!(report.contains("synth is out of service"));
    }

    #[tokio::test(start_paused = true)]
    async fn synthesis_timeout_is_a_diagnostic() {
        let cap = HangingCapability::new("synth");
        let token = CancellationToken::new();
        let report = report_with_synthesis(&cap, &results(), Duration::from_secs(30), &token)
            .await
            .unwrap();
        assert!(report.contains("plain concatenation"));
        assert!(report.contains("Synthesis error: Processing failed: no answer within 30s"));
    }

    #[tokio::test(start_paused = true)]
    async fn synthesis_timeout_signals_the_capability() {
        let cap = HangingCapability::new("synth");
        let token = CancellationToken::new();
        report_with_synthesis(&cap, &results(), Duration::from_secs(30), &token)
            .await
            .unwrap();
        assert_eq!(cap.cancellations(), 1);
        assert!(!token.is_cancelled(), "caller token must stay untouched");
    }

    #[tokio::test(start_paused = true)]
    async fn caller_cancellation_during_synthesis_is_an_error() {
        let cap = Arc::new(HangingCapability::new("synth"));
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let err = report_with_synthesis(cap.as_ref(), &results(), Duration::from_secs(30), &token)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Cancelled {
                phase: Phase::Synthesis
            }
        ));
        assert_eq!(cap.cancellations(), 1);
    }

    #[tokio::test]
    async fn already_cancelled_skips_synthesis() {
        let cap = RecordingCapability::new("synth");
        let token = CancellationToken::new();
        token.cancel();
        let err = report_with_synthesis(&cap, &results(), Duration::from_secs(5), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
        assert_eq!(cap.call_count(), 0);
    }
}
