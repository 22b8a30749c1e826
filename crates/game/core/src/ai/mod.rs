//! Enemy decision making.
//!
//! Enemies pick from their ability list with a fixed priority rule and
//! per-ability cooldowns. Role-aware targeting (low health, backline, AOE)
//! plugs in here once roles carry behaviour.
mod enemy;

pub use enemy::{EnemyDecision, EnemyDecisionProcedure, EnemyIdleReason};
