use serde::{Deserialize, Serialize};

use crate::record::Point;

/// Default reference frame the detector's boxes are expressed in
pub const DEFAULT_FRAME_WIDTH: f64 = 450.0;
pub const DEFAULT_FRAME_HEIGHT: f64 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Friendly,
    Enemy,
}

/// One of the four princess-tower slots (side x owner)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quadrant {
    LeftEnemy,
    RightEnemy,
    LeftFriendly,
    RightFriendly,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::LeftEnemy,
        Quadrant::RightEnemy,
        Quadrant::LeftFriendly,
        Quadrant::RightFriendly,
    ];

    pub fn from_parts(side: Side, owner: Owner) -> Self {
        match (side, owner) {
            (Side::Left, Owner::Enemy) => Quadrant::LeftEnemy,
            (Side::Right, Owner::Enemy) => Quadrant::RightEnemy,
            (Side::Left, Owner::Friendly) => Quadrant::LeftFriendly,
            (Side::Right, Owner::Friendly) => Quadrant::RightFriendly,
        }
    }

    pub fn side(self) -> Side {
        match self {
            Quadrant::LeftEnemy | Quadrant::LeftFriendly => Side::Left,
            Quadrant::RightEnemy | Quadrant::RightFriendly => Side::Right,
        }
    }

    pub fn owner(self) -> Owner {
        match self {
            Quadrant::LeftEnemy | Quadrant::RightEnemy => Owner::Enemy,
            Quadrant::LeftFriendly | Quadrant::RightFriendly => Owner::Friendly,
        }
    }

    /// Short label used in logs and snapshots
    pub fn label(self) -> &'static str {
        match self {
            Quadrant::LeftEnemy => "LE",
            Quadrant::RightEnemy => "RE",
            Quadrant::LeftFriendly => "LF",
            Quadrant::RightFriendly => "RF",
        }
    }
}

/// Size of the coordinate space incoming boxes live in. Every positional
/// classification goes through this, so it must match the detector input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: f64,
    pub height: f64,
}

impl Default for FrameSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

impl FrameSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn side_of(&self, x: f64) -> Side {
        if x < self.width / 2.0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Top half of the arena belongs to the opponent
    pub fn owner_of(&self, y: f64) -> Owner {
        if y < self.height / 2.0 {
            Owner::Enemy
        } else {
            Owner::Friendly
        }
    }

    pub fn quadrant_of(&self, p: Point) -> Quadrant {
        Quadrant::from_parts(self.side_of(p.x), self.owner_of(p.y))
    }

    pub fn is_opponent_half(&self, p: Point) -> bool {
        self.owner_of(p.y) == Owner::Enemy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_uses_half_dimensions() {
        let frame = FrameSize::default();
        assert_eq!(frame.quadrant_of(Point::new(100.0, 150.0)), Quadrant::LeftEnemy);
        assert_eq!(frame.quadrant_of(Point::new(350.0, 150.0)), Quadrant::RightEnemy);
        assert_eq!(frame.quadrant_of(Point::new(100.0, 650.0)), Quadrant::LeftFriendly);
        assert_eq!(frame.quadrant_of(Point::new(350.0, 650.0)), Quadrant::RightFriendly);
        // Exactly on the midline counts as right / friendly
        assert_eq!(frame.quadrant_of(Point::new(225.0, 400.0)), Quadrant::RightFriendly);
    }

    #[test]
    fn test_custom_frame_size() {
        let frame = FrameSize::new(1080.0, 1920.0);
        assert_eq!(frame.side_of(400.0), Side::Left);
        assert_eq!(frame.owner_of(900.0), Owner::Enemy);
        assert!(!frame.is_opponent_half(Point::new(0.0, 1000.0)));
    }

    #[test]
    fn test_quadrant_parts_roundtrip() {
        for q in Quadrant::ALL {
            assert_eq!(Quadrant::from_parts(q.side(), q.owner()), q);
        }
    }
}
