use rand::Rng;
use salvo_engine::{Board, Fleet, InvalidFleetError};

use crate::shooter::Shooter;

/// Result of one simulated game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOutcome {
    /// Shots fired before the game ended.
    pub shots: u32,
    /// Whether the whole fleet went down (as opposed to hitting the cap).
    pub fleet_sunk: bool,
}

/// Plays one game: the shooter fires at the fleet until every ship is sunk,
/// the shot cap is reached, or the shooter runs out of cells.
///
/// The shooter is reset before the first shot, so one shooter instance can
/// be reused across games.
///
/// # Errors
///
/// Returns [`InvalidFleetError`] when the fleet breaks the placement rules.
pub fn play_game<R>(
    fleet: &Fleet,
    shooter: &mut Shooter,
    shot_cap: u32,
    rng: &mut R,
) -> Result<GameOutcome, InvalidFleetError>
where
    R: Rng + ?Sized,
{
    let mut board = Board::new();
    board.place_fleet(fleet)?;
    shooter.reset();

    let mut shots = 0;
    while !board.all_ships_sunk() && shots < shot_cap {
        let Some((x, y)) = shooter.next_shot(&board, rng) else {
            break;
        };
        let result = board.shoot(x, y);
        shooter.notify_result(x, y, result, &board);
        shots += 1;
    }

    Ok(GameOutcome {
        shots,
        fleet_sunk: board.all_ships_sunk(),
    })
}
