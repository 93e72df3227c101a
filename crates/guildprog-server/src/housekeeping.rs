//! Retention for the append-only log tables.
//!
//! Notices, service uses and command replies are written once and read by
//! clients. Rows past their retention window are deleted here; a disbanded
//! guild's notices go with it.

use crate::tables::*;
use spacetimedb::{Identity, ReducerContext, Table};
use std::time::Duration;

const HOUR: u64 = 60 * 60;

pub const NOTICE_RETENTION: Duration = Duration::from_secs(7 * 24 * HOUR);
pub const SERVICE_USE_RETENTION: Duration = Duration::from_secs(24 * HOUR);
pub const REPLY_RETENTION: Duration = Duration::from_secs(24 * HOUR);

/// Rows deleted by one prune pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneCounts {
    pub notices: usize,
    pub service_uses: usize,
    pub replies: usize,
}

impl PruneCounts {
    pub fn total(&self) -> usize {
        self.notices + self.service_uses + self.replies
    }
}

/// Whether a row written at `written_micros` is older than `keep` at `now_micros`.
/// Rows stamped in the future are kept.
pub fn is_expired(now_micros: i64, written_micros: i64, keep: Duration) -> bool {
    let age = now_micros.saturating_sub(written_micros);
    age > 0 && age as u128 > keep.as_micros()
}

/// Delete every log row past its retention window.
pub fn prune_history(ctx: &ReducerContext) -> PruneCounts {
    let now = ctx.timestamp.to_micros_since_unix_epoch();
    let mut counts = PruneCounts::default();

    let notices: Vec<u64> = ctx
        .db
        .guild_notice()
        .iter()
        .filter(|n| is_expired(now, n.sent_at.to_micros_since_unix_epoch(), NOTICE_RETENTION))
        .map(|n| n.id)
        .collect();
    for id in notices {
        ctx.db.guild_notice().id().delete(id);
        counts.notices += 1;
    }

    let uses: Vec<u64> = ctx
        .db
        .service_use()
        .iter()
        .filter(|u| is_expired(now, u.used_at.to_micros_since_unix_epoch(), SERVICE_USE_RETENTION))
        .map(|u| u.id)
        .collect();
    for id in uses {
        ctx.db.service_use().id().delete(id);
        counts.service_uses += 1;
    }

    let replies: Vec<u64> = ctx
        .db
        .command_reply()
        .iter()
        .filter(|r| is_expired(now, r.issued_at.to_micros_since_unix_epoch(), REPLY_RETENTION))
        .map(|r| r.id)
        .collect();
    for id in replies {
        ctx.db.command_reply().id().delete(id);
        counts.replies += 1;
    }

    if counts.total() > 0 {
        log::info!(
            "Pruned {} notices, {} service uses, {} replies",
            counts.notices,
            counts.service_uses,
            counts.replies
        );
    }
    counts
}

/// Drop all notices of a guild.
pub fn delete_guild_notices(ctx: &ReducerContext, guild_id: u32) -> usize {
    let ids: Vec<u64> = ctx
        .db
        .guild_notice()
        .guild_id()
        .filter(guild_id)
        .map(|n| n.id)
        .collect();
    let count = ids.len();
    for id in ids {
        ctx.db.guild_notice().id().delete(id);
    }
    count
}

/// Drop every reply addressed to `identity`.
pub fn delete_replies_for(ctx: &ReducerContext, identity: Identity) -> usize {
    let ids: Vec<u64> = ctx
        .db
        .command_reply()
        .iter()
        .filter(|r| r.identity == identity)
        .map(|r| r.id)
        .collect();
    let count = ids.len();
    for id in ids {
        ctx.db.command_reply().id().delete(id);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: i64 = 1_000_000;

    #[test]
    fn fresh_rows_are_kept() {
        let now = 1_000_000 * SECOND;
        assert!(!is_expired(now, now, REPLY_RETENTION));
        assert!(!is_expired(now, now - 60 * SECOND, REPLY_RETENTION));
    }

    #[test]
    fn rows_past_retention_expire() {
        let now = 1_000_000 * SECOND;
        let day = 24 * 60 * 60 * SECOND;
        assert!(!is_expired(now, now - day, REPLY_RETENTION));
        assert!(is_expired(now, now - day - 1, REPLY_RETENTION));
        assert!(!is_expired(now, now - 6 * day, NOTICE_RETENTION));
        assert!(is_expired(now, now - 8 * day, NOTICE_RETENTION));
    }

    #[test]
    fn future_rows_are_kept() {
        let now = 1_000_000 * SECOND;
        assert!(!is_expired(now, now + 10 * SECOND, SERVICE_USE_RETENTION));
        assert!(!is_expired(i64::MIN, i64::MAX, SERVICE_USE_RETENTION));
    }
}
