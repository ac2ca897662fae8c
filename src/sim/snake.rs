//! Grid snake rig

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::state::Direction;

/// Result of one snake step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Head moved to a free cell
    Moved(IVec2),
    /// Head left the grid or ran into the body
    Crashed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snake {
    pub grid: i32,
    /// Head first
    pub body: Vec<IVec2>,
    pub heading: Direction,
    /// Direction applied on the next step
    pub queued: Option<Direction>,
    /// Pending growth segments
    pub grow: u32,
    pub step_acc_ms: f32,
}

impl Snake {
    pub fn new(grid: i32) -> Self {
        let c = grid / 2;
        Self {
            grid,
            body: vec![IVec2::new(c, c), IVec2::new(c, c + 1), IVec2::new(c, c + 2)],
            heading: Direction::Up,
            queued: None,
            grow: 0,
            step_acc_ms: 0.0,
        }
    }

    pub fn head(&self) -> IVec2 {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.grid && cell.y < self.grid
    }

    /// Queue a turn; reversing onto the neck is refused
    pub fn steer(&mut self, dir: Direction) -> bool {
        if dir == self.heading.opposite() {
            return false;
        }
        self.queued = Some(dir);
        true
    }

    /// Advance one cell
    pub fn step(&mut self) -> StepOutcome {
        if let Some(dir) = self.queued.take() {
            self.heading = dir;
        }
        let next = self.head() + self.heading.delta();
        if !self.in_bounds(next) {
            return StepOutcome::Crashed;
        }

        // The tail cell frees up this step unless the snake is growing
        let body_to_check = if self.grow > 0 {
            &self.body[..]
        } else {
            &self.body[..self.body.len() - 1]
        };
        if body_to_check.contains(&next) {
            return StepOutcome::Crashed;
        }

        self.body.insert(0, next);
        if self.grow > 0 {
            self.grow -= 1;
        } else {
            self.body.pop();
        }
        StepOutcome::Moved(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_heading_up() {
        let snake = Snake::new(20);
        assert_eq!(
            snake.body,
            vec![IVec2::new(10, 10), IVec2::new(10, 11), IVec2::new(10, 12)]
        );
        assert_eq!(snake.heading, Direction::Up);
    }

    #[test]
    fn test_step_and_grow() {
        let mut snake = Snake::new(20);
        assert_eq!(snake.step(), StepOutcome::Moved(IVec2::new(10, 9)));
        assert_eq!(snake.len(), 3);
        snake.grow = 1;
        snake.step();
        assert_eq!(snake.len(), 4);
        assert_eq!(snake.head(), IVec2::new(10, 8));
    }

    #[test]
    fn test_refuses_reversal() {
        let mut snake = Snake::new(20);
        assert!(!snake.steer(Direction::Down));
        assert!(snake.steer(Direction::Left));
        snake.step();
        assert_eq!(snake.head(), IVec2::new(9, 10));
        assert!(!snake.steer(Direction::Right));
    }

    #[test]
    fn test_wall_crash() {
        let mut snake = Snake::new(5);
        // Head at (2,2): two steps up reach row 0, the third leaves the grid
        assert!(matches!(snake.step(), StepOutcome::Moved(_)));
        assert!(matches!(snake.step(), StepOutcome::Moved(_)));
        assert_eq!(snake.step(), StepOutcome::Crashed);
    }

    #[test]
    fn test_self_crash() {
        let mut snake = Snake::new(20);
        snake.grow = 3;
        for dir in [Direction::Up, Direction::Left, Direction::Down] {
            snake.steer(dir);
            assert!(matches!(snake.step(), StepOutcome::Moved(_)));
        }
        snake.steer(Direction::Right);
        assert_eq!(snake.step(), StepOutcome::Crashed);
    }

    #[test]
    fn test_can_follow_own_tail() {
        // 2x2 loop: head moves into the cell the tail vacates
        let mut snake = Snake {
            grid: 5,
            body: vec![
                IVec2::new(1, 1),
                IVec2::new(2, 1),
                IVec2::new(2, 2),
                IVec2::new(1, 2),
            ],
            heading: Direction::Left,
            queued: Some(Direction::Down),
            grow: 0,
            step_acc_ms: 0.0,
        };
        assert_eq!(snake.step(), StepOutcome::Moved(IVec2::new(1, 2)));
    }
}
