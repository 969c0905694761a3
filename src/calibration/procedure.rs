// Interactive pointer calibration. Each prompt is its own stage so the
// sequence stays finite and every exit path is explicit.
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::calibration::{CalibrationOffset, CalibrationStore};
use crate::errors::{PilotError, PilotResult};
use crate::executor::backend::DRY_RUN_NAME;
use crate::executor::coordinator::{DevicePoint, RatioPoint};
use crate::executor::InputExecutor;

/// Calibration measures the physical pointer, so a dry-run backend would
/// only ever record a meaningless zero offset.
pub fn require_live_input(executor: &InputExecutor) -> PilotResult<()> {
    if executor.backend_name() == DRY_RUN_NAME {
        return Err(PilotError::Calibration(
            "calibration needs the OS input backend; set [input] backend = \"os\" and grant input permissions".into(),
        ));
    }
    Ok(())
}

/// The human on the other side of the prompts. End of input surfaces as
/// `PilotError::Cancelled`.
#[async_trait]
pub trait Operator: Send {
    async fn confirm(&mut self, question: &str) -> PilotResult<bool>;
    async fn acknowledge(&mut self, instruction: &str) -> PilotResult<()>;
    async fn report(&mut self, message: &str);
}

/// Prompts on stdout, answers from stdin.
pub struct ConsoleOperator {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleOperator {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn prompt(&mut self, text: &str) -> PilotResult<String> {
        let mut out = tokio::io::stdout();
        out.write_all(text.as_bytes()).await?;
        out.flush().await?;
        self.lines.next_line().await?.ok_or(PilotError::Cancelled)
    }
}

impl Default for ConsoleOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Operator for ConsoleOperator {
    async fn confirm(&mut self, question: &str) -> PilotResult<bool> {
        let answer = self.prompt(&format!("{question} [y/N] ")).await?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }

    async fn acknowledge(&mut self, instruction: &str) -> PilotResult<()> {
        self.prompt(&format!("{instruction} Press Enter when ready.")).await?;
        Ok(())
    }

    async fn report(&mut self, message: &str) {
        println!("{message}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalibrationOutcome {
    /// The operator saw the cursor centered; nothing changed.
    Unchanged,
    Saved(CalibrationOffset),
    /// Measured but rejected at the preview.
    Discarded(CalibrationOffset),
    /// End of input or an unreadable pointer; the store is untouched.
    Aborted,
    SaveFailed(CalibrationOffset, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    MoveToExpected,
    ConfirmCentered,
    CaptureManual,
    Preview(CalibrationOffset),
    ConfirmSave(CalibrationOffset),
    Finished,
}

pub struct CalibrationProcedure<'a> {
    executor: &'a mut InputExecutor,
    store: &'a CalibrationStore,
    expected: DevicePoint,
}

impl<'a> CalibrationProcedure<'a> {
    pub fn new(executor: &'a mut InputExecutor, store: &'a CalibrationStore) -> Self {
        let expected = executor.mapper().to_device_uncalibrated(RatioPoint::CENTER);
        Self {
            executor,
            store,
            expected,
        }
    }

    /// Screen center before any offset.
    pub fn expected(&self) -> DevicePoint {
        self.expected
    }

    pub async fn run(&mut self, operator: &mut dyn Operator) -> CalibrationOutcome {
        tracing::info!(
            x = self.expected.x,
            y = self.expected.y,
            store = %self.store.path().display(),
            "calibration started"
        );
        let mut stage = Stage::MoveToExpected;
        let mut outcome = CalibrationOutcome::Aborted;
        while stage != Stage::Finished {
            stage = match self.step(stage, operator).await {
                Ok((next, result)) => {
                    if let Some(result) = result {
                        outcome = result;
                    }
                    next
                }
                Err(PilotError::Cancelled) => {
                    tracing::warn!("calibration cancelled at end of input");
                    outcome = CalibrationOutcome::Aborted;
                    Stage::Finished
                }
                Err(e) => {
                    operator.report(&format!("Calibration stopped: {e}")).await;
                    outcome = CalibrationOutcome::Aborted;
                    Stage::Finished
                }
            };
        }
        tracing::info!(outcome = ?outcome, "calibration finished");
        outcome
    }

    async fn step(
        &mut self,
        stage: Stage,
        operator: &mut dyn Operator,
    ) -> PilotResult<(Stage, Option<CalibrationOutcome>)> {
        match stage {
            Stage::MoveToExpected => {
                self.glide(self.expected).await;
                Ok((Stage::ConfirmCentered, None))
            }
            Stage::ConfirmCentered => {
                if operator.confirm("Is the cursor centered on the screen?").await? {
                    Ok((Stage::Finished, Some(CalibrationOutcome::Unchanged)))
                } else {
                    Ok((Stage::CaptureManual, None))
                }
            }
            Stage::CaptureManual => {
                operator
                    .acknowledge("Move the mouse to the exact center of the screen.")
                    .await?;
                let manual = self.executor.pointer_position()?;
                let offset = CalibrationOffset::new(
                    manual.x - self.expected.x,
                    manual.y - self.expected.y,
                );
                tracing::info!(
                    x = manual.x,
                    y = manual.y,
                    dx = offset.dx,
                    dy = offset.dy,
                    "manual center captured"
                );
                Ok((Stage::Preview(offset), None))
            }
            Stage::Preview(offset) => {
                operator
                    .report(&format!("Measured offset dx={} dy={}.", offset.dx, offset.dy))
                    .await;
                self.glide(self.expected.offset_by(offset)).await;
                Ok((Stage::ConfirmSave(offset), None))
            }
            Stage::ConfirmSave(offset) => {
                if !operator.confirm("Is the cursor centered now? Save this offset?").await? {
                    return Ok((Stage::Finished, Some(CalibrationOutcome::Discarded(offset))));
                }
                let result = match self.store.save(offset) {
                    Ok(()) => {
                        self.executor.mapper_mut().set_offset(offset);
                        operator
                            .report(&format!("Saved to {}.", self.store.path().display()))
                            .await;
                        CalibrationOutcome::Saved(offset)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "calibration save failed");
                        operator.report(&format!("Could not save calibration: {e}")).await;
                        CalibrationOutcome::SaveFailed(offset, e.to_string())
                    }
                };
                Ok((Stage::Finished, Some(result)))
            }
            Stage::Finished => Ok((Stage::Finished, None)),
        }
    }

    async fn glide(&mut self, target: DevicePoint) {
        if let Err(e) = self.executor.glide_to(target).await {
            tracing::warn!(x = target.x, y = target.y, error = %e, "calibration glide failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    use crate::calibration::store::{X_OFFSET_KEY, Y_OFFSET_KEY};
    use crate::executor::backend::EventJournal;
    use crate::executor::input::tests::dry_executor;
    use crate::executor::safety::NoOverlay;

    /// `None` in `answers` behaves like end of input.
    struct ScriptedOperator {
        answers: VecDeque<Option<bool>>,
        journal: EventJournal,
        manual: DevicePoint,
        reports: Vec<String>,
    }

    impl ScriptedOperator {
        fn new(answers: &[Option<bool>], journal: EventJournal, manual: DevicePoint) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                journal,
                manual,
                reports: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl Operator for ScriptedOperator {
        async fn confirm(&mut self, _question: &str) -> PilotResult<bool> {
            self.answers.pop_front().flatten().ok_or(PilotError::Cancelled)
        }

        async fn acknowledge(&mut self, _instruction: &str) -> PilotResult<()> {
            self.journal.warp(self.manual);
            Ok(())
        }

        async fn report(&mut self, message: &str) {
            self.reports.push(message.to_string());
        }
    }

    #[test]
    fn dry_run_backend_cannot_calibrate() {
        let (exec, _) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        assert!(matches!(require_live_input(&exec), Err(PilotError::Calibration(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn centered_cursor_leaves_store_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(dir.path().join(".env"));
        let (mut exec, journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        let mut operator = ScriptedOperator::new(&[Some(true)], journal.clone(), DevicePoint::default());

        let outcome = CalibrationProcedure::new(&mut exec, &store).run(&mut operator).await;

        assert_eq!(outcome, CalibrationOutcome::Unchanged);
        assert_eq!(journal.position(), DevicePoint::new(960, 540));
        assert!(!store.path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn measured_offset_is_previewed_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(dir.path().join(".env"));
        std::fs::write(store.path(), "GEMINI_API_KEY=abc\n").unwrap();
        let (mut exec, journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        let mut operator = ScriptedOperator::new(
            &[Some(false), Some(true)],
            journal.clone(),
            DevicePoint::new(972, 530),
        );

        let outcome = CalibrationProcedure::new(&mut exec, &store).run(&mut operator).await;

        let offset = CalibrationOffset::new(12, -10);
        assert_eq!(outcome, CalibrationOutcome::Saved(offset));
        assert_eq!(journal.position(), DevicePoint::new(972, 530));
        assert_eq!(exec.mapper().offset(), offset);
        assert_eq!(store.load(), offset);
        let body = std::fs::read_to_string(store.path()).unwrap();
        assert!(body.starts_with("GEMINI_API_KEY=abc\n"));
        assert!(body.contains(&format!("{X_OFFSET_KEY}=12\n")));
        assert!(body.contains(&format!("{Y_OFFSET_KEY}=-10\n")));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_preview_discards_offset() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(dir.path().join(".env"));
        let (mut exec, journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        let mut operator = ScriptedOperator::new(
            &[Some(false), Some(false)],
            journal,
            DevicePoint::new(950, 545),
        );

        let outcome = CalibrationProcedure::new(&mut exec, &store).run(&mut operator).await;

        assert_eq!(outcome, CalibrationOutcome::Discarded(CalibrationOffset::new(-10, 5)));
        assert_eq!(exec.mapper().offset(), CalibrationOffset::ZERO);
        assert!(!store.path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_input_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(dir.path().join(".env"));
        let (mut exec, journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));

        let mut at_first = ScriptedOperator::new(&[None], journal.clone(), DevicePoint::default());
        let outcome = CalibrationProcedure::new(&mut exec, &store).run(&mut at_first).await;
        assert_eq!(outcome, CalibrationOutcome::Aborted);

        let mut at_save = ScriptedOperator::new(&[Some(false), None], journal, DevicePoint::new(1, 1));
        let outcome = CalibrationProcedure::new(&mut exec, &store).run(&mut at_save).await;
        assert_eq!(outcome, CalibrationOutcome::Aborted);
        assert!(!store.path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(dir.path().join("missing").join(".env"));
        let (mut exec, journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        let mut operator = ScriptedOperator::new(
            &[Some(false), Some(true)],
            journal,
            DevicePoint::new(965, 540),
        );

        let outcome = CalibrationProcedure::new(&mut exec, &store).run(&mut operator).await;

        assert!(matches!(
            outcome,
            CalibrationOutcome::SaveFailed(offset, _) if offset == CalibrationOffset::new(5, 0)
        ));
        assert_eq!(exec.mapper().offset(), CalibrationOffset::ZERO);
        assert!(operator.reports.iter().any(|r| r.starts_with("Could not save calibration")));
    }
}
