mod engine;
mod game;
mod term;

/// Board-space unit. Positions are multiples of the cell size and may go
/// negative when the head leaves the playable area.
pub type Unit = i32;
pub type Coords = (Unit, Unit);

pub type TermInt = u16;
pub type ScreenCoords = (TermInt, TermInt);

fn main() {
    let mut game = game::SnakeGame::new();
    game.initialize();
    game.show_intro();

    loop {
        // The main game loop takes care of exiting cleanly on CTRL+C
        game.play();
    }
}
