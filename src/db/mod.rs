mod schema;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::geometry::{Quat, Transform, Vec3};
use crate::models::*;
use crate::world::WorldSnapshot;

/// SQLite store for what the host keeps across restarts.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "quarrylock")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("quarrylock.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Save
    // ============================================================

    /// Replaces the stored world with `snapshot`.
    pub fn save_world(&self, snapshot: &WorldSnapshot) -> Result<()> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        tx.execute_batch(
            "DELETE FROM gate_whitelist;
             DELETE FROM gates;
             DELETE FROM sub_components;
             DELETE FROM rigs;",
        )?;

        for rig in &snapshot.rigs {
            let t = rig.transform;
            tx.execute(
                "INSERT INTO rigs (id, variant, owner_id, pos_x, pos_y, pos_z, rot_x, rot_y, rot_z, rot_w)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    rig.id.to_string(),
                    rig.variant.as_str(),
                    rig.owner.map(player_to_sql),
                    t.position.x,
                    t.position.y,
                    t.position.z,
                    t.rotation.x,
                    t.rotation.y,
                    t.rotation.z,
                    t.rotation.w,
                ],
            )?;
        }

        for component in &snapshot.components {
            tx.execute(
                "INSERT INTO sub_components (id, rig_id, role, prefab) VALUES (?, ?, ?, ?)",
                (
                    component.id.to_string(),
                    component.rig_id.map(|id| id.to_string()),
                    component.role.as_str(),
                    &component.prefab,
                ),
            )?;
        }

        for gate in &snapshot.gates {
            let t = gate.local;
            tx.execute(
                "INSERT INTO gates (id, parent_id, owner_id, code, locked,
                                    pos_x, pos_y, pos_z, rot_x, rot_y, rot_z, rot_w, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    gate.id.to_string(),
                    gate.parent.map(|id| id.to_string()),
                    gate.owner.map(player_to_sql),
                    &gate.code,
                    gate.locked as i32,
                    t.position.x,
                    t.position.y,
                    t.position.z,
                    t.rotation.x,
                    t.rotation.y,
                    t.rotation.z,
                    t.rotation.w,
                    gate.created_at.to_rfc3339(),
                ],
            )?;
            for player in &gate.whitelist {
                tx.execute(
                    "INSERT INTO gate_whitelist (gate_id, player_id) VALUES (?, ?)",
                    (gate.id.to_string(), player_to_sql(*player)),
                )?;
            }
        }

        tx.commit().context("Failed to commit world snapshot")?;
        tracing::info!(
            "Saved {} rigs, {} components, {} gates",
            snapshot.rigs.len(),
            snapshot.components.len(),
            snapshot.gates.len()
        );
        Ok(())
    }

    // ============================================================
    // Load
    // ============================================================

    pub fn load_world(&self) -> Result<WorldSnapshot> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let mut stmt = conn.prepare(
            "SELECT id, variant, owner_id, pos_x, pos_y, pos_z, rot_x, rot_y, rot_z, rot_w
             FROM rigs",
        )?;
        let rigs = stmt
            .query_map([], |row| {
                Ok(Rig {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    variant: Variant::from_str(&row.get::<_, String>(1)?)
                        .unwrap_or(Variant::Mobile),
                    owner: row.get::<_, Option<i64>>(2)?.map(player_from_sql),
                    transform: read_transform(row, 3)?,
                    slots: BTreeMap::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare("SELECT id, rig_id, role, prefab FROM sub_components")?;
        let mut components = stmt
            .query_map([], |row| {
                Ok((
                    parse_uuid(row.get::<_, String>(0)?),
                    row.get::<_, Option<String>>(1)?.map(parse_uuid),
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|(id, rig_id, role, prefab)| {
                let Some(role) = Role::from_str(&role) else {
                    tracing::warn!("Dropping sub-component {} with unknown role '{}'", id, role);
                    return None;
                };
                Some(SubComponent {
                    id,
                    rig_id,
                    role,
                    prefab,
                    lock: None,
                    persistent: true,
                })
            })
            .collect::<Vec<_>>();

        let mut whitelists: HashMap<Uuid, BTreeSet<PlayerId>> = HashMap::new();
        let mut stmt = conn.prepare("SELECT gate_id, player_id FROM gate_whitelist")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                parse_uuid(row.get::<_, String>(0)?),
                player_from_sql(row.get::<_, i64>(1)?),
            ))
        })?;
        for row in rows {
            let (gate_id, player) = row?;
            whitelists.entry(gate_id).or_default().insert(player);
        }

        let mut stmt = conn.prepare(
            "SELECT id, parent_id, owner_id, code, locked,
                    pos_x, pos_y, pos_z, rot_x, rot_y, rot_z, rot_w, created_at
             FROM gates",
        )?;
        let gates = stmt
            .query_map([], |row| {
                let id = parse_uuid(row.get::<_, String>(0)?);
                Ok(Gate {
                    id,
                    parent: row.get::<_, Option<String>>(1)?.map(parse_uuid),
                    owner: row.get::<_, Option<i64>>(2)?.map(player_from_sql),
                    code: row.get(3)?,
                    locked: row.get::<_, i32>(4)? != 0,
                    local: read_transform(row, 5)?,
                    created_at: parse_datetime(row.get::<_, String>(12)?),
                    whitelist: whitelists.remove(&id).unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // The lock slot is derived from the gate side.
        for gate in &gates {
            if let Some(component) = components
                .iter_mut()
                .find(|c| Some(c.id) == gate.parent)
            {
                component.lock = Some(gate.id);
            }
        }

        Ok(WorldSnapshot {
            rigs,
            components,
            gates,
        })
    }
}

// ============================================================
// Helper functions
// ============================================================

fn read_transform(row: &Row<'_>, start: usize) -> rusqlite::Result<Transform> {
    Ok(Transform::new(
        Vec3::new(row.get(start)?, row.get(start + 1)?, row.get(start + 2)?),
        Quat {
            x: row.get(start + 3)?,
            y: row.get(start + 4)?,
            z: row.get(start + 5)?,
            w: row.get(start + 6)?,
        },
    ))
}

/// SQLite has no unsigned 64-bit integers; ids are stored bit-for-bit.
fn player_to_sql(player: PlayerId) -> i64 {
    player.0 as i64
}

fn player_from_sql(raw: i64) -> PlayerId {
    PlayerId(raw as u64)
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::from_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
