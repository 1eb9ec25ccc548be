use crate::clock::{Clock, SystemClock};
use crate::content::ContentSupplier;
use crate::metrics::MetricsRecorder;
use crate::mode::GameMode;
use crate::record::SessionRecord;
use crate::runtime::SessionEvent;
use crate::time_series::WpmSample;
use log::info;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Input {
    pub char: char,
    pub outcome: Outcome,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// No key pressed yet.
    Waiting,
    Typing,
    Finished,
    Aborted,
}

/// One user typing through a backlog of units in a given mode.
///
/// The recorder only starts on the first keystroke. A session ends when the
/// backlog runs dry, when a timed session runs out of time, or on quit. Only
/// the first two produce a [`SessionRecord`].
#[derive(Debug)]
pub struct TypingSession<C: Clock = SystemClock> {
    user_id: String,
    mode: GameMode,
    duration_secs: Option<u64>,
    supplier: ContentSupplier,
    recorder: MetricsRecorder<C>,
    prompt: Vec<char>,
    input: Vec<Input>,
    units_completed: usize,
    samples: Vec<WpmSample>,
    status: SessionStatus,
    record: Option<SessionRecord>,
}

impl TypingSession<SystemClock> {
    pub fn new(user_id: impl Into<String>, mode: GameMode, supplier: ContentSupplier) -> Self {
        Self::with_clock(user_id, mode, supplier, SystemClock)
    }
}

impl<C: Clock> TypingSession<C> {
    pub fn with_clock(
        user_id: impl Into<String>,
        mode: GameMode,
        mut supplier: ContentSupplier,
        clock: C,
    ) -> Self {
        let duration_secs = mode
            .is_timed()
            .then(|| mode.default_duration().max(0) as u64);
        let (prompt, status) = match next_unit(&mut supplier) {
            Some(unit) => (unit, SessionStatus::Waiting),
            None => (Vec::new(), SessionStatus::Finished),
        };

        Self {
            user_id: user_id.into(),
            mode,
            duration_secs,
            supplier,
            recorder: MetricsRecorder::with_clock(clock),
            prompt,
            input: Vec::new(),
            units_completed: 0,
            samples: Vec::new(),
            status,
            record: None,
        }
    }

    /// Override the time limit of a timed session. Ignored in untimed modes.
    pub fn with_duration(mut self, secs: u64) -> Self {
        if self.mode.is_timed() {
            self.duration_secs = Some(secs);
        }
        self
    }

    /// Feed one event; returns the record if this event ended the session.
    pub fn handle(&mut self, event: SessionEvent) -> Option<SessionRecord> {
        match event {
            SessionEvent::Key(c) => self.on_key(c),
            SessionEvent::Backspace => {
                self.on_backspace();
                None
            }
            SessionEvent::Tick => self.on_tick(),
            SessionEvent::Quit => {
                self.quit();
                None
            }
        }
    }

    pub fn on_key(&mut self, c: char) -> Option<SessionRecord> {
        if self.is_over() {
            return None;
        }
        if self.status == SessionStatus::Waiting {
            self.recorder.start();
            self.status = SessionStatus::Typing;
        }
        if self.time_is_up() {
            return Some(self.finish());
        }

        let expected = self.prompt[self.input.len()];
        let outcome = if c == expected {
            self.recorder.record_correct(c);
            Outcome::Correct
        } else {
            self.recorder.record_error(expected, c);
            Outcome::Incorrect
        };
        self.input.push(Input { char: c, outcome });

        if self.input.len() == self.prompt.len() {
            return self.advance();
        }
        None
    }

    /// Erase the last keystroke if it was a mistake. Correct keystrokes stay committed.
    pub fn on_backspace(&mut self) {
        if self.status != SessionStatus::Typing {
            return;
        }
        if let Some(Input {
            outcome: Outcome::Incorrect,
            ..
        }) = self.input.last()
        {
            self.input.pop();
            self.recorder.undo_last_error();
        }
    }

    pub fn on_tick(&mut self) -> Option<SessionRecord> {
        if self.status != SessionStatus::Typing {
            return None;
        }
        self.samples.push(WpmSample::new(
            self.recorder.elapsed_seconds(),
            self.recorder.current_wpm(),
        ));

        if self.time_is_up() {
            return Some(self.finish());
        }
        None
    }

    /// Abandon the session without producing a record.
    pub fn quit(&mut self) {
        if self.is_over() {
            return;
        }
        self.recorder.stop();
        self.status = SessionStatus::Aborted;
        info!("session for {} aborted", self.user_id);
    }

    fn advance(&mut self) -> Option<SessionRecord> {
        self.units_completed += 1;
        self.input.clear();

        match next_unit(&mut self.supplier) {
            Some(unit) => {
                self.prompt = unit;
                None
            }
            None => Some(self.finish()),
        }
    }

    fn finish(&mut self) -> SessionRecord {
        let record = self.recorder.finish(&self.user_id, self.mode);
        info!(
            "session for {} finished: {:.1} wpm, {:.1}% accuracy over {}s",
            self.user_id,
            record.wpm(),
            record.accuracy(),
            record.duration_secs()
        );
        self.status = SessionStatus::Finished;
        self.record = Some(record.clone());
        record
    }

    fn time_is_up(&self) -> bool {
        self.duration_secs
            .is_some_and(|limit| self.recorder.elapsed_seconds() >= limit)
    }

    fn is_over(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Finished | SessionStatus::Aborted
        )
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn has_started(&self) -> bool {
        self.recorder.has_started()
    }

    pub fn has_finished(&self) -> bool {
        self.is_over()
    }

    pub fn prompt(&self) -> String {
        self.prompt.iter().collect()
    }

    pub fn input(&self) -> &[Input] {
        &self.input
    }

    pub fn cursor_pos(&self) -> usize {
        self.input.len()
    }

    pub fn units_completed(&self) -> usize {
        self.units_completed
    }

    pub fn units_remaining(&self) -> usize {
        self.supplier.remaining()
    }

    pub fn seconds_remaining(&self) -> Option<u64> {
        self.duration_secs
            .map(|limit| limit.saturating_sub(self.recorder.elapsed_seconds()))
    }

    pub fn recorder(&self) -> &MetricsRecorder<C> {
        &self.recorder
    }

    pub fn samples(&self) -> &[WpmSample] {
        &self.samples
    }

    pub fn record(&self) -> Option<&SessionRecord> {
        self.record.as_ref()
    }
}

/// Next non-empty unit from the backlog.
fn next_unit(supplier: &mut ContentSupplier) -> Option<Vec<char>> {
    std::iter::from_fn(|| supplier.next())
        .map(|unit| unit.chars().collect::<Vec<_>>())
        .find(|chars| !chars.is_empty())
}
