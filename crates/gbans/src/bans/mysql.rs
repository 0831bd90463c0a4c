use std::net::IpAddr;

use sqlx::Row;
use sqlx::mysql::MySqlRow;

use crate::bans::{BanReason, BanSource, BanStateLookup, BanType, PlayerBanState};
use crate::database::{self, Database};
use crate::time::Timestamp;
use crate::SteamId;

/// `check_ban` resolves precedence between all ban sources and returns at most one row.
///
/// If nothing matches, it returns a single row of `NULL`s.
#[async_trait::async_trait]
impl BanStateLookup for Database {
    async fn query_ban_state(
        &self,
        steam_id: SteamId,
        ip: IpAddr,
    ) -> database::Result<Option<PlayerBanState>> {
        let Some(row) = sqlx::query("CALL check_ban(?, ?)")
            .bind(steam_id)
            .bind(ip.to_string())
            .fetch_optional(self.as_ref())
            .await?
        else {
            return Ok(None);
        };

        parse_row(&row)
    }
}

fn parse_row(row: &MySqlRow) -> database::Result<Option<PlayerBanState>> {
    let Some(ban_source) = row.try_get::<Option<String>, _>("out_ban_source")? else {
        return Ok(None);
    };

    let ban_source = ban_source
        .parse::<BanSource>()
        .map_err(|err| database::Error::decode_column("out_ban_source", err))?;

    let ban_type = row
        .try_get::<Option<i64>, _>("out_ban_type")?
        .map_or(Some(BanType::Unknown), BanType::from_repr)
        .ok_or_else(|| database::Error::decode_column("out_ban_type", UnknownBanType))?;

    let steam_id = row
        .try_get::<Option<i64>, _>("out_steam_id")?
        .and_then(|steam_id| u64::try_from(steam_id).ok())
        .and_then(|steam_id| SteamId::from_u64(steam_id).ok());

    Ok(Some(PlayerBanState {
        steam_id,
        ban_source,
        ban_id: row
            .try_get::<Option<i64>, _>("out_ban_id")?
            .and_then(|ban_id| u64::try_from(ban_id).ok())
            .unwrap_or_default(),
        ban_type,
        reason: row
            .try_get::<Option<i64>, _>("out_reason")?
            .map_or(BanReason::Unknown, BanReason::from_repr),
        evade_ok: row.try_get::<Option<bool>, _>("out_evade_ok")?.unwrap_or_default(),
        valid_until: row
            .try_get::<Option<Timestamp>, _>("out_valid_until")?
            .unwrap_or_else(Timestamp::now),
    }))
}

#[derive(Debug, Display, Error)]
#[display("unknown ban type")]
struct UnknownBanType;
