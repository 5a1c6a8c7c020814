//! Dice rolling system.
//!
//! Supports `NdX`, `NdX+Z`, `NdX-Z` and a trailing `adv`/`dis` for
//! advantage or disadvantage. Rolling never touches a generator directly;
//! it draws from any [`IntSource`], so tests can force exact faces.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid dice expression: {0}")]
    InvalidExpression(String),
    #[error("Dice count must be between 1 and 100: {0}")]
    InvalidCount(u64),
    #[error("Dice sides must be between 1 and 1000: {0}")]
    InvalidSides(u64),
    #[error("Dice modifier must be between -10000 and 10000: {0}")]
    InvalidModifier(i64),
}

/// Largest modifier magnitude a parsed expression may carry.
pub const MAX_MODIFIER: i32 = 10_000;

/// Anything that can produce an integer in an inclusive range.
pub trait IntSource {
    fn int(&mut self, min: i32, max: i32) -> i32;
}

/// Advantage state for a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Advantage {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

/// A parsed dice expression (e.g., 2d6+3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
    pub advantage: Advantage,
}

impl DiceExpression {
    /// Build an expression directly. Used for the engine's fixed rolls.
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count: count.clamp(1, 100),
            sides: sides.clamp(1, 1000),
            modifier: modifier.clamp(-MAX_MODIFIER, MAX_MODIFIER),
            advantage: Advantage::Normal,
        }
    }

    pub fn with_advantage(mut self, advantage: Advantage) -> Self {
        self.advantage = advantage;
        self
    }

    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let expr = notation.trim().to_lowercase();
        let invalid = || DiceError::InvalidExpression(notation.to_string());

        let (body, advantage) = if let Some(rest) = expr.strip_suffix("adv") {
            (rest, Advantage::Advantage)
        } else if let Some(rest) = expr.strip_suffix("dis") {
            (rest, Advantage::Disadvantage)
        } else {
            (expr.as_str(), Advantage::Normal)
        };

        let (count_str, rest) = body.split_once('d').ok_or_else(invalid)?;
        let (sides_str, modifier_str) = match rest.find(['+', '-']) {
            Some(idx) => (&rest[..idx], Some(&rest[idx..])),
            None => (rest, None),
        };

        let count = parse_digits(count_str).ok_or_else(invalid)?;
        let sides = parse_digits(sides_str).ok_or_else(invalid)?;
        let modifier = match modifier_str {
            Some(m) => {
                let (sign, digits) = m.split_at(1);
                let magnitude = parse_digits(digits).ok_or_else(invalid)?;
                let magnitude = i64::try_from(magnitude).unwrap_or(i64::MAX);
                if sign == "-" {
                    -magnitude
                } else {
                    magnitude
                }
            }
            None => 0,
        };

        if !(1..=100).contains(&count) {
            return Err(DiceError::InvalidCount(count));
        }
        if !(1..=1000).contains(&sides) {
            return Err(DiceError::InvalidSides(sides));
        }
        let modifier = checked_modifier(modifier)?;

        Ok(Self {
            count: count as u32,
            sides: sides as u32,
            modifier,
            advantage,
        })
    }

    /// Roll the expression against the given source.
    pub fn roll_with<S: IntSource + ?Sized>(&self, source: &mut S) -> RollResult {
        let sides = self.sides as i32;
        match self.advantage {
            Advantage::Normal => {
                let rolls: Vec<i32> = (0..self.count).map(|_| source.int(1, sides)).collect();
                let total = rolls
                    .iter()
                    .fold(0i32, |sum, r| sum.saturating_add(*r))
                    .saturating_add(self.modifier);
                RollResult {
                    total,
                    rolls,
                    modifier: self.modifier,
                    kept: None,
                }
            }
            Advantage::Advantage | Advantage::Disadvantage => {
                let first = source.int(1, sides);
                let second = source.int(1, sides);
                let chosen = if self.advantage == Advantage::Advantage {
                    first.max(second)
                } else {
                    first.min(second)
                };
                RollResult {
                    total: chosen.saturating_add(self.modifier),
                    rolls: vec![first, second],
                    modifier: self.modifier,
                    kept: Some(vec![chosen]),
                }
            }
        }
    }
}

fn checked_modifier(value: i64) -> Result<i32, DiceError> {
    let bound = i64::from(MAX_MODIFIER);
    if (-bound..=bound).contains(&value) {
        Ok(value as i32)
    } else {
        Err(DiceError::InvalidModifier(value))
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Saturate so an absurd count reports a range error rather than a syntax error.
    Some(s.parse::<u64>().unwrap_or(u64::MAX))
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        if self.modifier > 0 {
            write!(f, "+{}", self.modifier)?;
        } else if self.modifier < 0 {
            write!(f, "{}", self.modifier)?;
        }
        match self.advantage {
            Advantage::Normal => Ok(()),
            Advantage::Advantage => write!(f, "adv"),
            Advantage::Disadvantage => write!(f, "dis"),
        }
    }
}

/// Result of a roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub total: i32,
    pub rolls: Vec<i32>,
    pub modifier: i32,
    /// Present only for advantage and disadvantage rolls.
    pub kept: Option<Vec<i32>>,
}

impl RollResult {
    /// The face that counts: the kept die, or the first die rolled.
    pub fn natural(&self) -> i32 {
        self.kept
            .as_ref()
            .and_then(|k| k.first().copied())
            .or_else(|| self.rolls.first().copied())
            .unwrap_or(0)
    }

    /// Sum of the counted dice without the modifier.
    pub fn dice_total(&self) -> i32 {
        self.total - self.modifier
    }

    pub fn meets_dc(&self, dc: i32) -> bool {
        self.total >= dc
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces: Vec<String> = self.rolls.iter().map(|r| r.to_string()).collect();
        write!(f, "[{}]", faces.join(", "))?;
        if self.modifier > 0 {
            write!(f, " + {}", self.modifier)?;
        } else if self.modifier < 0 {
            write!(f, " - {}", self.modifier.abs())?;
        }
        write!(f, " = {}", self.total)
    }
}

/// Parse and roll in one step.
pub fn roll<S: IntSource + ?Sized>(notation: &str, source: &mut S) -> Result<RollResult, DiceError> {
    Ok(DiceExpression::parse(notation)?.roll_with(source))
}

/// Roll with the expression's modifier replaced by `modifier`.
pub fn roll_with_modifier<S: IntSource + ?Sized>(
    notation: &str,
    modifier: i32,
    source: &mut S,
) -> Result<RollResult, DiceError> {
    let mut expr = DiceExpression::parse(notation)?;
    expr.modifier = checked_modifier(i64::from(modifier))?;
    Ok(expr.roll_with(source))
}

/// 2d20, keep highest.
pub fn roll_advantage<S: IntSource + ?Sized>(source: &mut S) -> RollResult {
    DiceExpression::new(1, 20, 0)
        .with_advantage(Advantage::Advantage)
        .roll_with(source)
}

/// 2d20, keep lowest.
pub fn roll_disadvantage<S: IntSource + ?Sized>(source: &mut S) -> RollResult {
    DiceExpression::new(1, 20, 0)
        .with_advantage(Advantage::Disadvantage)
        .roll_with(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRng;
    use crate::testing::ScriptedRolls;

    #[test]
    fn test_parse_simple() {
        let expr = DiceExpression::parse("2d6").unwrap();
        assert_eq!(expr.count, 2);
        assert_eq!(expr.sides, 6);
        assert_eq!(expr.modifier, 0);
        assert_eq!(expr.advantage, Advantage::Normal);
    }

    #[test]
    fn test_parse_with_modifier() {
        let expr = DiceExpression::parse(" 1D20+5 ").unwrap();
        assert_eq!((expr.count, expr.sides, expr.modifier), (1, 20, 5));

        let expr = DiceExpression::parse("3d8-2").unwrap();
        assert_eq!(expr.modifier, -2);
    }

    #[test]
    fn test_parse_advantage_suffix() {
        assert_eq!(
            DiceExpression::parse("1d20adv").unwrap().advantage,
            Advantage::Advantage
        );
        assert_eq!(
            DiceExpression::parse("1d20+2dis").unwrap().advantage,
            Advantage::Disadvantage
        );
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "d6", "2d", "abc", "2d6+", "2d6+1+1", "1d20 adv", "2x6", "-1d6"] {
            assert!(
                matches!(DiceExpression::parse(bad), Err(DiceError::InvalidExpression(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_out_of_range() {
        assert_eq!(DiceExpression::parse("0d6"), Err(DiceError::InvalidCount(0)));
        assert_eq!(DiceExpression::parse("101d6"), Err(DiceError::InvalidCount(101)));
        assert_eq!(DiceExpression::parse("1d0"), Err(DiceError::InvalidSides(0)));
        assert_eq!(DiceExpression::parse("1d1001"), Err(DiceError::InvalidSides(1001)));
        assert!(DiceExpression::parse("100d1000").is_ok());
    }

    #[test]
    fn test_huge_modifier_is_an_error() {
        let mut rng = SeededRng::new(1);
        assert_eq!(
            roll("1d20+2147483647", &mut rng),
            Err(DiceError::InvalidModifier(2_147_483_647))
        );
        assert_eq!(
            roll("1d20-99999999999", &mut rng),
            Err(DiceError::InvalidModifier(-99_999_999_999))
        );
        assert!(matches!(
            roll_with_modifier("1d6", i32::MAX, &mut rng),
            Err(DiceError::InvalidModifier(_))
        ));

        let result = roll("100d1000+10000", &mut rng).unwrap();
        assert!(result.total <= 110_000);
        assert_eq!(DiceExpression::new(1, 6, i32::MIN).modifier, -MAX_MODIFIER);
    }

    #[test]
    fn test_roll_range() {
        let mut rng = SeededRng::new(99);
        for _ in 0..200 {
            let result = roll("3d6+1", &mut rng).unwrap();
            assert!((4..=19).contains(&result.total));
            assert_eq!(result.rolls.len(), 3);
            assert!(result.kept.is_none());
        }
    }

    #[test]
    fn test_roll_scripted() {
        let mut rolls = ScriptedRolls::new([4, 2]);
        let result = roll("2d6+3", &mut rolls).unwrap();
        assert_eq!(result.rolls, vec![4, 2]);
        assert_eq!(result.total, 9);
        assert_eq!(result.dice_total(), 6);
    }

    #[test]
    fn test_advantage_keeps_max_and_adds_modifier_after() {
        let mut rolls = ScriptedRolls::new([5, 17]);
        let result = roll("1d20+2adv", &mut rolls).unwrap();
        assert_eq!(result.rolls, vec![5, 17]);
        assert_eq!(result.kept, Some(vec![17]));
        assert_eq!(result.total, 19);
        assert_eq!(result.natural(), 17);
    }

    #[test]
    fn test_disadvantage_keeps_min() {
        let mut rolls = ScriptedRolls::new([5, 17]);
        let result = roll_disadvantage(&mut rolls);
        assert_eq!(result.kept, Some(vec![5]));
        assert_eq!(result.total, 5);

        let mut rolls = ScriptedRolls::new([3, 11]);
        assert_eq!(roll_advantage(&mut rolls).total, 11);
    }

    #[test]
    fn test_roll_with_modifier_replaces() {
        let mut rolls = ScriptedRolls::new([6]);
        let result = roll_with_modifier("1d6+10", -2, &mut rolls).unwrap();
        assert_eq!(result.total, 4);
        assert_eq!(result.modifier, -2);
    }

    #[test]
    fn test_display_round_trip() {
        for notation in ["2d6", "1d20+5", "3d8-2", "1d20adv"] {
            let expr: DiceExpression = notation.parse().unwrap();
            assert_eq!(expr.to_string(), notation);
        }
    }
}
