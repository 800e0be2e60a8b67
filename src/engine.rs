use std::collections::VecDeque;

use crate::{Coords, Unit};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use Direction::*;
use StepResult::*;

/// Side of one grid cell. Every board position is a multiple of this on
/// both axes.
pub const CELL: Unit = 10;

/// Minimum spacing between two discrete steps, in milliseconds. The driver
/// may call `advance` far more often; everything below this gap is a no-op.
pub const TICK_MS: u64 = 200;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

/// Playable area, in the same units as positions. A non-positive side means
/// the area hasn't been measured; the boundary check is skipped and food
/// stays where it is until a usable size shows up.
#[derive(Copy, Clone, Debug)]
pub struct Bounds {
    pub width: Unit,
    pub height: Unit,
}

pub enum StepResult {
    /// Below the tick threshold, or the game is already over.
    Skipped,
    Moved { new_head: Coords, grew: bool },
    /// The head landed on or past a wall. The body still includes it.
    Crashed { head: Coords },
}

/// Read-only copy of the board for drawing, body head-first.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Snapshot {
    pub body: Vec<Coords>,
    pub food: Coords,
    pub alive: bool,
}

pub struct Engine {
    body: VecDeque<Coords>,
    direction: Direction,
    food: Coords,
    alive: bool,
    last_step: u64,
    rng: StdRng,
}

impl Engine {
    pub fn new(start: Coords, bounds: Bounds) -> Self {
        Self::with_rng(start, bounds, StdRng::from_entropy())
    }

    pub fn with_rng(start: Coords, bounds: Bounds, mut rng: StdRng) -> Self {
        let body: VecDeque<Coords> = std::iter::once(start).collect();
        let food = place_food(bounds, &body, &mut rng)
            .unwrap_or((start.0 + 10 * CELL, start.1));

        Engine { body, direction: Right, food, alive: true, last_step: 0, rng }
    }

    /// The newest value wins; turning straight back into the body is allowed.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Performs at most one discrete step. `now` is a monotonic millisecond
    /// timestamp; steps end up spaced at least `TICK_MS` apart no matter how
    /// often the driver calls this. `bounds` is read fresh on every call,
    /// nothing about it is cached across ticks.
    pub fn advance(&mut self, now: u64, bounds: Bounds) -> StepResult {
        if !self.alive || now.saturating_sub(self.last_step) < TICK_MS {
            return Skipped;
        }

        let new_head = shift(self.body[0], self.direction);
        let grew = new_head == self.food;

        if grew {
            // Respawn before the head is committed: the occupancy filter
            // only sees the pre-growth body, so the cell the head is
            // entering stays a candidate.
            if let Some(food) = place_food(bounds, &self.body, &mut self.rng) {
                self.food = food;
            }
        } else {
            self.body.pop_back();
        }

        self.body.push_front(new_head);
        self.last_step = now;

        if bounds.contains(new_head) {
            Moved { new_head, grew }
        } else {
            self.alive = false;
            Crashed { head: new_head }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            body: self.body.iter().copied().collect(),
            food: self.food,
            alive: self.alive,
        }
    }

    #[cfg(test)]
    fn set_food(&mut self, food: Coords) {
        self.food = food;
    }
}

impl Bounds {
    pub fn new(width: Unit, height: Unit) -> Self {
        Bounds { width, height }
    }

    fn usable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    // Touching the wall counts as out, on all four sides. Unusable bounds
    // never reject anything.
    fn contains(&self, (x, y): Coords) -> bool {
        !self.usable() || (x > 0 && x < self.width && y > 0 && y < self.height)
    }
}

fn shift((x, y): Coords, direction: Direction) -> Coords {
    match direction {
        Up => (x, y - CELL),
        Right => (x + CELL, y),
        Down => (x, y + CELL),
        Left => (x - CELL, y),
    }
}

// Rejection-samples grid-aligned cells until one is free of the given body.
// May spin forever on a fully occupied board. None when the bounds are too
// small to hold a single cell.
fn place_food(bounds: Bounds, body: &VecDeque<Coords>, rng: &mut StdRng) -> Option<Coords> {
    if !bounds.usable() {
        return None;
    }

    let cells_x = (bounds.width - CELL) / CELL;
    let cells_y = (bounds.height - CELL) / CELL;
    if cells_x <= 0 || cells_y <= 0 {
        return None;
    }

    loop {
        let candidate = (rng.gen_range(0..cells_x) * CELL, rng.gen_range(0..cells_y) * CELL);
        if !body.contains(&candidate) {
            return Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BOUNDS: Bounds = Bounds { width: 400, height: 600 };

    fn engine_at(start: Coords) -> Engine {
        Engine::with_rng(start, BOUNDS, StdRng::seed_from_u64(7))
    }

    fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Up), Just(Right), Just(Down), Just(Left)]
    }

    fn arb_cell() -> impl Strategy<Value = Coords> {
        (-500i32..500, -500i32..500).prop_map(|(x, y)| (x * CELL, y * CELL))
    }

    proptest! {
        #[test]
        fn shift_changes_one_axis_by_one_cell(head in arb_cell(), dir in arb_direction()) {
            let (x, y) = shift(head, dir);
            let dx = (x - head.0).abs();
            let dy = (y - head.1).abs();
            prop_assert_eq!(dx + dy, CELL);
            prop_assert!(dx == 0 || dy == 0);
        }

        #[test]
        fn shift_is_undone_by_the_opposite_direction(head in arb_cell(), dir in arb_direction()) {
            let opposite = match dir {
                Up => Down,
                Down => Up,
                Left => Right,
                Right => Left,
            };
            prop_assert_eq!(shift(shift(head, dir), opposite), head);
        }

        #[test]
        fn advance_below_the_tick_gap_changes_nothing(dt in 0u64..TICK_MS) {
            let mut engine = engine_at((200, 300));
            engine.advance(TICK_MS, BOUNDS);

            let before = engine.snapshot();
            assert!(matches!(engine.advance(TICK_MS + dt, BOUNDS), Skipped));
            prop_assert_eq!(engine.snapshot(), before);
        }
    }

    #[test]
    fn first_step_waits_for_the_tick_gap() {
        let mut engine = engine_at((200, 300));
        engine.set_food((-100, -100));

        assert!(matches!(engine.advance(0, BOUNDS), Skipped));
        assert_eq!(engine.snapshot().body, vec![(200, 300)]);

        assert!(matches!(engine.advance(199, BOUNDS), Skipped));
        assert!(matches!(engine.advance(200, BOUNDS), Moved { .. }));
        assert_eq!(engine.snapshot().body, vec![(210, 300)]);
    }

    #[test]
    fn each_call_advances_at_most_one_step() {
        let mut engine = engine_at((200, 300));
        engine.set_food((-100, -100));

        // A huge gap still yields a single step.
        assert!(matches!(engine.advance(10_000, BOUNDS), Moved { .. }));
        assert_eq!(engine.snapshot().body, vec![(210, 300)]);
    }

    #[test]
    fn body_length_is_stable_without_food() {
        let mut engine = engine_at((200, 300));
        engine.set_food((-100, -100)); // parked out of reach

        for i in 1..=5 {
            engine.advance(i * TICK_MS, BOUNDS);
            assert_eq!(engine.snapshot().body.len(), 1);
        }
        assert_eq!(engine.snapshot().body, vec![(250, 300)]);
    }

    #[test]
    fn eating_food_grows_by_one_and_respawns_it() {
        let mut engine = engine_at((200, 300));
        engine.set_food((210, 300));

        assert!(matches!(engine.advance(0, BOUNDS), Skipped));
        let result = engine.advance(200, BOUNDS);
        assert!(matches!(result, Moved { new_head: (210, 300), grew: true }));

        let snap = engine.snapshot();
        assert_eq!(snap.body, vec![(210, 300), (200, 300)]);
        assert!(snap.alive);

        // New food is grid-aligned, inside the board, and off the cell the
        // search was told about (the pre-growth body).
        assert_ne!(snap.food, (200, 300));
        assert_eq!(snap.food.0 % CELL, 0);
        assert_eq!(snap.food.1 % CELL, 0);
        assert!(snap.food.0 >= 0 && snap.food.0 < BOUNDS.width);
        assert!(snap.food.1 >= 0 && snap.food.1 < BOUNDS.height);
    }

    #[test]
    fn direction_change_applies_on_the_next_step() {
        let mut engine = engine_at((200, 300));
        engine.set_food((-100, -100));

        engine.advance(200, BOUNDS);
        engine.set_direction(Down);
        engine.advance(400, BOUNDS);

        assert_eq!(engine.snapshot().body, vec![(210, 310)]);
    }

    #[test]
    fn reversing_direction_is_not_filtered() {
        let mut engine = engine_at((200, 300));
        engine.set_food((-100, -100));

        engine.set_direction(Left);
        engine.advance(200, BOUNDS);

        assert_eq!(engine.snapshot().body, vec![(190, 300)]);
    }

    #[test]
    fn leaving_the_board_is_terminal() {
        let mut engine = engine_at((0, 300));
        engine.set_direction(Left);

        let result = engine.advance(200, BOUNDS);
        assert!(matches!(result, Crashed { head: (-10, 300) }));

        // The out-of-bounds head is committed before the check fires.
        let dead = engine.snapshot();
        assert_eq!(dead.body, vec![(-10, 300)]);
        assert!(!dead.alive);

        // Terminal state: nothing moves anymore, at any timestamp.
        for i in 2..=4 {
            assert!(matches!(engine.advance(i * 1_000, BOUNDS), Skipped));
            assert_eq!(engine.snapshot(), dead);
        }
    }

    #[test]
    fn touching_the_far_edge_is_terminal() {
        let mut engine = engine_at((390, 300));
        engine.set_food((-100, -100));

        assert!(matches!(engine.advance(200, BOUNDS), Crashed { head: (400, 300) }));
        assert!(!engine.snapshot().alive);
    }

    #[test]
    fn unusable_bounds_skip_the_boundary_check() {
        let none = Bounds::new(0, 0);
        let mut engine = engine_at((0, 300));
        engine.set_direction(Left);

        for i in 1..=3 {
            assert!(matches!(engine.advance(i * TICK_MS, none), Moved { .. }));
        }

        let snap = engine.snapshot();
        assert_eq!(snap.body, vec![(-30, 300)]);
        assert!(snap.alive);
    }

    #[test]
    fn unusable_bounds_keep_the_current_food() {
        let none = Bounds::new(0, 0);
        let mut engine = engine_at((200, 300));
        engine.set_food((210, 300));

        assert!(matches!(engine.advance(200, none), Moved { grew: true, .. }));

        let snap = engine.snapshot();
        assert_eq!(snap.body.len(), 2);
        assert_eq!(snap.food, (210, 300));
    }

    #[test]
    fn snapshot_is_a_detached_copy() {
        let mut engine = engine_at((200, 300));
        engine.set_food((-100, -100));

        let before = engine.snapshot();
        engine.advance(200, BOUNDS);

        assert_eq!(before.body, vec![(200, 300)]);
        assert_ne!(engine.snapshot(), before);
    }

    #[test]
    fn initial_food_avoids_the_body() {
        for seed in 0..50 {
            let engine = Engine::with_rng((200, 300), BOUNDS, StdRng::seed_from_u64(seed));
            let snap = engine.snapshot();
            assert_ne!(snap.food, (200, 300));
        }
    }
}
