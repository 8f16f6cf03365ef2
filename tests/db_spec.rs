mod common;

use common::*;
use quarry_lock::db::Database;
use quarry_lock::host::EntityHost;
use quarry_lock::models::*;
use quarry_lock::plugin::ServerStart;
use quarry_lock::world::World;
use speculate2::speculate;

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to open database");
        db.migrate().expect("Failed to migrate");

        let fx = Fixture::new(quarry_lock::config::Config {
            auto_lock_on_placement: true,
            auto_authorize_team: true,
            reconcile_delay_ms: 1,
            ..Default::default()
        });
        let rig = fx.spawn_rig(Variant::Static, Some(OWNER));
        let gate = fx.deploy(&rig, Role::Hopper, OWNER);
    }

    describe "saving and loading" {
        it "starts empty" {
            let fresh = Database::open_memory().unwrap();
            fresh.migrate().unwrap();

            let snapshot = fresh.load_world().unwrap();
            assert!(snapshot.rigs.is_empty());
            assert!(snapshot.gates.is_empty());
        }

        it "round-trips rigs and gates" {
            db.save_world(&fx.world.lock().unwrap().snapshot()).unwrap();

            let snapshot = db.load_world().unwrap();

            assert_eq!(snapshot.rigs.len(), 1);
            let loaded_rig = &snapshot.rigs[0];
            assert_eq!(loaded_rig.id, rig.id);
            assert_eq!(loaded_rig.variant, Variant::Static);
            assert_eq!(loaded_rig.owner, Some(PlayerId(OWNER)));
            assert!(loaded_rig.transform.approx_eq(&rig.transform, 1e-6));

            assert_eq!(snapshot.gates.len(), 1);
            let loaded = &snapshot.gates[0];
            assert_eq!(loaded.id, gate.id);
            assert_eq!(loaded.code, gate.code);
            assert_eq!(loaded.whitelist, gate.whitelist);
            assert!(loaded.locked);
            assert_eq!(loaded.owner, Some(PlayerId(OWNER)));
            assert_eq!(loaded.parent, gate.parent);
            assert!(loaded.local.approx_eq(&gate.local, 1e-6));
        }

        it "keeps large player ids intact" {
            let big = PlayerId(u64::MAX - 7);
            fx.world
                .lock()
                .unwrap()
                .gate_mut(gate.id)
                .unwrap()
                .authorize(big);
            db.save_world(&fx.world.lock().unwrap().snapshot()).unwrap();

            let snapshot = db.load_world().unwrap();
            assert!(snapshot.gates[0].whitelist.contains(&big));
        }

        it "stores only persistent sub-components" {
            db.save_world(&fx.world.lock().unwrap().snapshot()).unwrap();

            let snapshot = db.load_world().unwrap();

            assert_eq!(snapshot.components.len(), 1);
            let component = &snapshot.components[0];
            assert_eq!(component.role, Role::Hopper);
            assert_eq!(component.rig_id, Some(rig.id));
            assert_eq!(component.lock, Some(gate.id));
            assert!(component.persistent);
        }

        it "replaces the previous save" {
            db.save_world(&fx.world.lock().unwrap().snapshot()).unwrap();
            fx.world.lock().unwrap().destroy(gate.id);
            db.save_world(&fx.world.lock().unwrap().snapshot()).unwrap();

            let snapshot = db.load_world().unwrap();
            assert!(snapshot.gates.is_empty());
            assert_eq!(snapshot.rigs.len(), 1);
        }
    }

    describe "an on-disk database" {
        it "survives being reopened" {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("data").join("quarrylock.db");

            let disk = Database::open(path.clone()).unwrap();
            disk.migrate().unwrap();
            disk.save_world(&fx.world.lock().unwrap().snapshot()).unwrap();
            drop(disk);

            let reopened = Database::open(path).unwrap();
            reopened.migrate().unwrap();
            let snapshot = reopened.load_world().unwrap();
            assert_eq!(snapshot.gates.len(), 1);
            assert_eq!(snapshot.gates[0].id, gate.id);
        }
    }

    describe "a restart through the database" {
        it "reattaches the gate after reconciliation" {
            db.save_world(&fx.world.lock().unwrap().snapshot()).unwrap();
            let stale = fx.component(rig.id, Role::Hopper);

            let world = World::restore(db.load_world().unwrap());
            let restarted = Fixture::with_world(fx.plugin.config().clone(), world);
            let fresh = restarted.component(rig.id, Role::Hopper);
            assert_ne!(fresh, stale);

            let report = tokio_test::block_on(async {
                restarted
                    .plugin
                    .on_server_initialized(ServerStart::Cold)
                    .unwrap()
                    .await
                    .unwrap()
            });

            assert_eq!(report.migrated, 1);
            let migrated = restarted.gate_on(fresh).expect("gate on fresh hopper");
            assert_eq!(migrated.id, gate.id);
            assert_eq!(migrated.code, gate.code);
            assert!(migrated.is_authorized(PlayerId(TEAMMATE)));
        }
    }
}
