use std::{process::exit, thread::sleep, time::Duration, time::Instant};

use crate::engine::{Bounds, Direction::{self, *}, Engine, Snapshot, StepResult::*, CELL};
use crate::term::TermManager;
use crate::{Coords, ScreenCoords, TermInt, Unit};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const FRAME_MS: u64 = 5;

const SNAKE_BODY_CHAR: char = '█';
const FOOD_CHAR: char = 'O';
const DEAD_SNAKE_CHAR: char = 'X';

pub struct SnakeGame {
    width: TermInt,
    height: TermInt,
    term: TermManager,
}

impl SnakeGame {
    pub fn new() -> Self {
        SnakeGame { width: 0, height: 0, term: TermManager::new() }
    }

    pub fn initialize(&mut self) {
        self.term.setup();

        let (w, h) = self.term.get_terminal_size();
        self.width = w;
        self.height = h;
    }

    pub fn show_intro(&mut self) {
        let lines = &[
            "Arrow keys or WASD to move",
            "CTRL+C to quit",
            "",
            "Press any key to begin"
        ];

        self.term.show_message(lines);

        if is_ctrl_c(&self.term.read_key_blocking()) {
            self.clean_exit()
        }
    }

    pub fn play(&mut self) {
        self.term.clear();
        self.term.draw_borders();

        let bounds = self.engine_bounds();
        let start = (snap_to_cell(bounds.width / 2), snap_to_cell(bounds.height / 2));
        let mut engine = Engine::new(start, bounds);

        let clock = Instant::now();
        let mut drawn: Vec<Coords> = vec![];

        self.draw_board(&engine.snapshot(), &mut drawn);

        loop {
            sleep(Duration::from_millis(FRAME_MS));

            for key_ev in self.term.read_key_events_queue() {
                if is_ctrl_c(&key_ev) {
                    self.clean_exit();
                }

                // Unmapped keys never reach the engine
                if let Some(dir) = key_direction(&key_ev) {
                    engine.set_direction(dir);
                }
            }

            match engine.advance(clock.elapsed().as_millis() as u64, bounds) {
                Skipped => {}
                Moved { .. } => self.draw_board(&engine.snapshot(), &mut drawn),
                Crashed { .. } => {
                    let snap = engine.snapshot();
                    self.draw_board(&snap, &mut drawn);
                    self.game_over(snap.body.len());
                    break;
                }
            }
        } // Game loop

        // Quit if the user CTRL+C's after the game
        if is_ctrl_c(&self.term.read_key_blocking()) {
            self.clean_exit()
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn clean_exit(&mut self) {
        self.term.restore();
        exit(0);
    }

    fn game_over(&mut self, length: usize) {
        self.term.show_message(&[
            "Game over!",
            &*format!("Length: {}", length),
            "",
            "Press any key to play again,",
            "or CTRL+C to quit."
        ]);
    }

    fn draw_board(&mut self, snap: &Snapshot, drawn: &mut Vec<Coords>) {
        for pos in drawn.drain(..) {
            if let Some(cell) = self.to_screen(pos) {
                self.term.print_at(cell, ' ');
            }
        }

        if let Some(cell) = self.to_screen(snap.food) {
            self.term.print_at(cell, FOOD_CHAR);
            drawn.push(snap.food);
        }

        let body_char = if snap.alive { SNAKE_BODY_CHAR } else { DEAD_SNAKE_CHAR };
        for &pos in &snap.body {
            if let Some(cell) = self.to_screen(pos) {
                self.term.print_at(cell, body_char);
                drawn.push(pos);
            }
        }

        self.term.flush();
    }

    // The playable area is the space inside the border frame, one terminal
    // cell per grid cell.
    fn engine_bounds(&self) -> Bounds {
        Bounds::new((self.width as Unit - 2) * CELL, (self.height as Unit - 2) * CELL)
    }

    // Board units to a terminal cell inside the borders. None for positions
    // off the playable area, e.g. the head after a crash.
    fn to_screen(&self, (x, y): Coords) -> Option<ScreenCoords> {
        if x < 0 || y < 0 {
            return None;
        }

        let col = 1 + (x / CELL) as TermInt;
        let row = 1 + (y / CELL) as TermInt;

        if col >= self.width - 1 || row >= self.height - 1 {
            None
        } else {
            Some((col, row))
        }
    }
}

fn key_direction(ev: &KeyEvent) -> Option<Direction> {
    match ev.code {
        KeyCode::Char('w') | KeyCode::Up => Some(Up),
        KeyCode::Char('a') | KeyCode::Left => Some(Left),
        KeyCode::Char('s') | KeyCode::Down => Some(Down),
        KeyCode::Char('d') | KeyCode::Right => Some(Right),
        _ => None,
    }
}

fn snap_to_cell(v: Unit) -> Unit {
    v / CELL * CELL
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
