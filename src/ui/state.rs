use std::fmt::Debug;

use crate::{
    event::TICK_FPS,
    ui::{input::InputLine, theme::Theme},
};
use tui_logger::*;

pub struct UiState {
    pub tick: f64,
    pub theme: Theme,
    pub input: InputLine,
    pub logger_state: TuiWidgetState,
}

impl Debug for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiState")
            .field("tick", &self.tick)
            .field("input", &self.input)
            .finish()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tick: Default::default(),
            theme: Theme::dark(),
            input: InputLine::default(),
            logger_state: TuiWidgetState::new(),
        }
    }
}

impl UiState {
    pub fn tick(&mut self) {
        self.tick += 1.0;
        if self.tick >= 2.0 * TICK_FPS {
            self.tick = 0.0;
        }
    }

    pub fn step_of_4_in_1_second(&self) -> usize {
        (self.tick * 4.0 / TICK_FPS) as usize % 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throbber_cycles_four_times_a_second() {
        let mut t = UiState::default();
        let per_step = (TICK_FPS / 4.0) as usize;
        let mut seen = Vec::new();
        for _ in 0..(2 * TICK_FPS as usize) {
            seen.push(t.step_of_4_in_1_second());
            t.tick();
        }
        assert_eq!(seen.len(), 8 * per_step);
        for (i, step) in seen.iter().enumerate() {
            assert_eq!(*step, (i / per_step) % 4, "After {} ticks", i);
        }
        assert_eq!(t.tick, 0.0, "tick counter wraps after two seconds");
    }
}
