//! Statistics module for VowArc
//!
//! This module provides the behavioral adherence analytics behind the
//! Small Wins summary and the Day 21 tier.

mod small_wins;

pub use small_wins::{
    average_rate, checkin_streak, compute_small_wins, rate, MetricsConfig, SmallWinsCounts,
    SmallWinsMetrics, Tier, TierAssessment, TierCopy, TrialWindow,
};
