/* Copyright (C) 2024  AlphaKeks <alphakeks@dawn.sh>
 *
 * This library is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this repository.  If not, see <https://www.gnu.org/licenses/>.
 */

//! The access-control and ban-state engine game server plugins talk to.
//!
//! Plugins poll this crate (through the HTTP layer in `gbans-api`) for admin, group and override
//! snapshots, and ask it whether a connecting player is allowed to play. Moderators manage the
//! underlying catalogs through the same API.

#[macro_use]
extern crate derive_more;

#[allow(unused_imports)]
#[macro_use(trace, debug, info, warn, error)]
extern crate tracing;

#[macro_use]
mod macros;

pub mod config;
pub use config::Config;

pub mod context;
pub use context::Context;

pub mod database;

pub mod steam_id;
pub use steam_id::SteamId;

pub mod steam;

pub mod time;

pub mod sourcemod;
pub mod bans;
pub mod seed;

pub mod persons;
pub mod evasion;
pub mod notifications;
pub mod servers;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
