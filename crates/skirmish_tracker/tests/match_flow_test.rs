//! End-to-end match flow through `MatchSession` with a scripted world.

use skirmish_core::weapon::{HAND_GRENADE, MG42};
use skirmish_core::{BodyRegion, EntityHandle, PlayerSlot, WeaponId};
use skirmish_rank::{PointTable, RankSaver, WeaponPoints};
use skirmish_tracker::{
    FieldValue, MatchSession, MessageKind, MockWorld, Scope, StatFilter, StatsEvent, TrackerConfig,
    TEAM_ALLIES, TEAM_AXIS,
};
use std::path::PathBuf;
use std::sync::Arc;

fn temp_rank_path(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("skirmish_match_{tag}_{nanos}.dat"))
}

fn slot(n: i32) -> PlayerSlot {
    PlayerSlot::new(n).unwrap()
}

fn wid(n: i32) -> WeaponId {
    WeaponId::new(n).unwrap()
}

/// Engine message ids, assigned in registry order from 64.
fn msg(kind: MessageKind) -> i32 {
    let index = MessageKind::ALL.iter().position(|k| *k == kind).unwrap();
    64 + index as i32
}

struct Match {
    session: MatchSession<MockWorld>,
}

impl Match {
    fn new(config: TrackerConfig) -> Self {
        let points = PointTable::uniform(WeaponPoints { kill: 2, hit: 0, teamkill: -2 });
        let mut session = MatchSession::new(config, MockWorld::new(), Arc::new(points));
        for kind in MessageKind::ALL {
            session.register_message(kind.name(), msg(kind)).unwrap();
        }
        session.finish_registration();
        Self { session }
    }

    fn join(&mut self, n: i32, name: &str, team: i32) -> EntityHandle {
        let entity = self.session.world_mut().join(slot(n), team);
        self.session.player_connect(slot(n), name, &format!("id:{n}"));
        entity
    }

    fn send(&mut self, kind: MessageKind, subject: Option<EntityHandle>, fields: &[i32]) {
        self.session.message_begin(msg(kind), subject);
        for f in fields {
            self.session.message_field(FieldValue::Int(*f));
        }
        self.session.message_end();
    }

    fn cur_weapon(&mut self, subject: EntityHandle, weapon: i32, clip: i32) {
        self.send(MessageKind::CurWeapon, Some(subject), &[1, weapon, clip]);
    }

    fn shots(&self, n: i32, weapon: WeaponId) -> i32 {
        self.session
            .stats(slot(n), Scope::Life, StatFilter::Weapon(weapon))
            .map_or(0, |e| e.shots)
    }

    fn events(&self) -> Vec<StatsEvent> {
        self.session.events().drain()
    }
}

#[test]
fn test_single_shot_without_switch() {
    let mut m = Match::new(TrackerConfig::default());
    let e = m.join(1, "Garand", TEAM_ALLIES);

    m.cur_weapon(e, 5, 30);
    m.events();
    m.cur_weapon(e, 5, 29);

    assert_eq!(m.shots(1, wid(5)), 1);
    assert_eq!(m.session.accumulator().clip(slot(1), wid(5)), Some(29));
    assert!(m.events().is_empty());
}

#[test]
fn test_mg42_and_reload_rules() {
    let mut m = Match::new(TrackerConfig::default());
    let e = m.join(1, "Gunner", TEAM_AXIS);

    m.cur_weapon(e, 17, 250);
    m.cur_weapon(e, 17, 248);
    m.cur_weapon(e, 17, 247);
    m.cur_weapon(e, 17, 250);
    assert_eq!(m.shots(1, MG42), 1);
}

#[test]
fn test_weapon_switch_notification() {
    let mut m = Match::new(TrackerConfig::default());
    let e = m.join(1, "Switcher", TEAM_ALLIES);
    m.cur_weapon(e, 7, 30);
    m.cur_weapon(e, 3, 7);
    assert_eq!(
        m.events(),
        vec![StatsEvent::WeaponSwitch { player: slot(1), old: wid(7), new: wid(3) }]
    );
}

#[test]
fn test_kill_attribution_through_health_message() {
    let mut m = Match::new(TrackerConfig::default());
    let shooter = m.join(1, "Alpha", TEAM_ALLIES);
    let target = m.join(2, "Bravo", TEAM_AXIS);

    m.cur_weapon(shooter, 7, 30);
    m.session.aim_trace(slot(1), BodyRegion::Head as i32);
    m.session.world_mut().hurt(slot(2), shooter, 100);
    m.session.world_mut().set_alive(slot(2), false);
    m.send(MessageKind::Health, Some(target), &[0]);

    let events = m.events();
    assert_eq!(
        events,
        vec![
            StatsEvent::Damage {
                attacker: slot(1),
                victim: slot(2),
                amount: 100,
                weapon: wid(7),
                region: Some(BodyRegion::Head),
                teamkill: false,
            },
            StatsEvent::Death {
                killer: slot(1),
                victim: slot(2),
                weapon: wid(7),
                region: Some(BodyRegion::Head),
                teamkill: false,
            },
        ]
    );

    let alpha = m.session.stats(slot(1), Scope::Session, StatFilter::All).unwrap();
    assert_eq!((alpha.kills, alpha.headshots, alpha.points), (1, 1, 2));
    let versus = m.session.versus(slot(2), StatFilter::Attacker(slot(1))).unwrap();
    assert_eq!(versus.name, "Alpha");
    assert_eq!(versus.stats.kills, 1);
}

#[test]
fn test_grenade_damage_goes_to_thrower() {
    let mut m = Match::new(TrackerConfig::default());
    m.join(1, "Thrower", TEAM_ALLIES);
    m.join(2, "Target", TEAM_AXIS);
    let target = m.session.world().entity_of(slot(2));
    let nade = m.session.world_mut().spawn_entity([10.0, 0.0, 0.0]);

    m.session.projectile_trace(slot(1), nade, "grenade", [10.0, 0.0, 0.0]);
    m.session.world_mut().advance(1.5);
    m.session.world_mut().hurt(slot(2), nade, 70);
    m.send(MessageKind::Health, target, &[]);

    let events = m.events();
    assert!(matches!(events[0], StatsEvent::GrenadeExplosion { weapon, .. } if weapon == HAND_GRENADE));
    assert!(matches!(
        events[1],
        StatsEvent::Damage { attacker, weapon, .. } if attacker == slot(1) && weapon == HAND_GRENADE
    ));
}

#[test]
fn test_expired_grenade_becomes_self_damage() {
    let mut m = Match::new(TrackerConfig::default());
    m.join(1, "Thrower", TEAM_ALLIES);
    m.join(2, "Target", TEAM_AXIS);
    let target = m.session.world().entity_of(slot(2));
    let nade = m.session.world_mut().spawn_entity([0.0; 3]);

    m.session.projectile_trace(slot(1), nade, "grenade2", [0.0; 3]);
    m.session.world_mut().advance(2.0);
    m.session.world_mut().hurt(slot(2), nade, 70);
    m.send(MessageKind::Health, target, &[]);

    let last = m.events().pop().unwrap();
    assert_eq!(
        last,
        StatsEvent::Damage {
            attacker: slot(2),
            victim: slot(2),
            amount: 70,
            weapon: WeaponId::NONE,
            region: None,
            teamkill: false,
        }
    );
}

#[test]
fn test_deferred_life_reset_flushes_once() {
    let mut m = Match::new(TrackerConfig::default());
    let shooter = m.join(1, "Alpha", TEAM_ALLIES);
    let target = m.join(2, "Bravo", TEAM_AXIS);

    m.session.world_mut().hurt(slot(2), shooter, 100);
    m.session.world_mut().set_alive(slot(2), false);
    m.send(MessageKind::Health, Some(target), &[]);

    m.session.world_mut().set_time(10.0);
    m.send(MessageKind::ResetHud, Some(shooter), &[]);

    m.session.world_mut().set_time(10.1);
    m.session.think(slot(1));
    assert_eq!(m.session.rank_count(), 0);
    assert_eq!(m.session.stats(slot(1), Scope::Life, StatFilter::All).unwrap().kills, 1);

    m.session.world_mut().set_time(10.25);
    m.session.think(slot(1));
    assert_eq!(m.session.stats(slot(1), Scope::Life, StatFilter::All).unwrap().kills, 0);
    assert_eq!(m.session.stats(slot(1), Scope::Round, StatFilter::All).unwrap().kills, 1);

    let (entry, position) = m.session.rank_stats(slot(1)).unwrap();
    assert_eq!((entry.name(), entry.stats().kills, position), ("Alpha", 1, 1));

    m.session.world_mut().set_time(20.0);
    m.session.think(slot(1));
    assert_eq!(m.session.rank_stats(slot(1)).unwrap().0.stats().kills, 1);
}

#[test]
fn test_round_state_schedules_every_player() {
    let mut m = Match::new(TrackerConfig::default());
    let a = m.join(1, "Alpha", TEAM_ALLIES);
    m.join(2, "Bravo", TEAM_AXIS);
    m.cur_weapon(a, 7, 30);
    m.cur_weapon(a, 7, 29);

    m.send(MessageKind::RoundState, Some(a), &[1]);
    for n in 1..=2 {
        assert!(m.session.accumulator().player(slot(n)).pending_round().is_some());
    }

    m.session.world_mut().set_time(1.0);
    m.session.think(slot(1));
    assert_eq!(m.session.stats(slot(1), Scope::Round, StatFilter::All).unwrap().shots, 0);
    assert_eq!(m.session.stats(slot(1), Scope::Life, StatFilter::All).unwrap().shots, 1);
}

#[test]
fn test_objective_score_delta_and_delayed_notify() {
    let mut m = Match::new(TrackerConfig::default());
    let e = m.join(3, "Capper", TEAM_ALLIES);
    m.cur_weapon(e, 7, 30);
    m.cur_weapon(e, 7, 29);
    m.events();

    m.send(MessageKind::ObjScore, None, &[3, 5]);
    m.session.world_mut().set_time(0.1);
    m.session.think(slot(3));
    assert!(m.events().is_empty());

    m.session.world_mut().set_time(0.3);
    m.session.think(slot(3));
    assert_eq!(m.events(), vec![StatsEvent::Score { player: slot(3), delta: 5, total: 5 }]);

    m.send(MessageKind::ObjScore, None, &[3, 8]);
    m.session.world_mut().set_time(1.0);
    m.session.think(slot(3));
    assert_eq!(m.events(), vec![StatsEvent::Score { player: slot(3), delta: 3, total: 8 }]);
    assert_eq!(m.session.stats(slot(3), Scope::Session, StatFilter::Weapon(wid(7))).unwrap().points, 8);
}

#[test]
fn test_teardown_saves_and_next_match_loads() {
    let path = temp_rank_path("teardown");
    let config = TrackerConfig {
        rank_file: path.clone(),
        ..TrackerConfig::default()
    };

    let mut m = Match::new(config.clone());
    let shooter = m.join(1, "Alpha", TEAM_ALLIES);
    let target = m.join(2, "Bravo", TEAM_AXIS);
    m.session.world_mut().hurt(slot(2), shooter, 100);
    m.session.world_mut().set_alive(slot(2), false);
    m.send(MessageKind::Health, Some(target), &[]);
    m.session.teardown().unwrap();

    let mut next = Match::new(config);
    assert_eq!(next.session.load_rank(), 2);
    let (top, has_next) = next.session.rank_entry_at(1).unwrap();
    assert_eq!((top.name(), top.stats().kills, has_next), ("Alpha", 1, true));
    let (last, has_next) = next.session.rank_entry_at(2).unwrap();
    assert_eq!((last.name(), last.stats().deaths, has_next), ("Bravo", 1, false));

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_disconnect_after_teardown_does_not_flush_again() {
    let path = temp_rank_path("teardown_disconnect");
    let config = TrackerConfig {
        rank_file: path.clone(),
        ..TrackerConfig::default()
    };
    let mut m = Match::new(config);
    let e = m.join(1, "Alpha", TEAM_ALLIES);
    m.cur_weapon(e, 7, 30);
    m.cur_weapon(e, 7, 29);

    m.session.teardown().unwrap();
    assert_eq!(m.session.rank_entry_at(1).unwrap().0.stats().shots, 1);
    assert_eq!(m.session.stats(slot(1), Scope::Life, StatFilter::All).unwrap().shots, 0);

    m.session.player_disconnect(slot(1));
    let (entry, has_next) = m.session.rank_entry_at(1).unwrap();
    assert_eq!((entry.stats().shots, has_next), (1, false));

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_reset_on_teardown_writes_empty_rank() {
    let path = temp_rank_path("reset");
    let config = TrackerConfig {
        rank_file: path.clone(),
        reset_rank_on_teardown: true,
        ..TrackerConfig::default()
    };
    let mut m = Match::new(config.clone());
    let e = m.join(1, "Alpha", TEAM_ALLIES);
    m.cur_weapon(e, 7, 30);
    m.cur_weapon(e, 7, 29);

    let saver = RankSaver::spawn().unwrap();
    m.session.teardown_background(&saver).unwrap();
    let stats = saver.shutdown();
    assert_eq!(stats.saves_completed, 1);

    let mut next = Match::new(config);
    assert_eq!(next.session.load_rank(), 0);
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_missing_rank_file_loads_empty() {
    let config = TrackerConfig {
        rank_file: temp_rank_path("missing"),
        ..TrackerConfig::default()
    };
    let mut m = Match::new(config);
    assert_eq!(m.session.load_rank(), 0);
    assert!(m.session.rank_entry_at(1).is_none());
}

#[test]
fn test_flush_all_and_reset_all() {
    let mut m = Match::new(TrackerConfig::default());
    let a = m.join(1, "Alpha", TEAM_ALLIES);
    m.join(2, "Bravo", TEAM_AXIS);
    m.cur_weapon(a, 7, 30);
    m.cur_weapon(a, 7, 29);
    m.events();

    m.session.flush_all_stats();
    assert_eq!(
        m.events(),
        vec![
            StatsEvent::StatsFlush { player: slot(1) },
            StatsEvent::StatsFlush { player: slot(2) },
        ]
    );

    m.session.reset_all_stats();
    assert_eq!(m.session.stats(slot(1), Scope::Session, StatFilter::All).unwrap().shots, 0);
    assert!(m.session.stats(slot(5), Scope::Session, StatFilter::All).is_none());
}
