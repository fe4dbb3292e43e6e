use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec2;
use log::info;

use rusted_combat::engine::input::{Action, InputSnapshot};
use rusted_combat::engine::{EnvironmentSnapshot, GameLoop};
use rusted_combat::game::actions::{ActionTable, HandlerRegistry};
use rusted_combat::game::characters::{
    Character, CharacterEvent, CharacterManager, CharacterStats, ClipLibrary, Loadout,
};

/// Downward acceleration of the toy ground model (units/s^2)
const GRAVITY: f32 = 90.0;

/// Length of the scripted fight
const DEMO_LENGTH_MS: u64 = 6_000;

const PLAYER_SPAWN: Vec2 = Vec2::new(0.0, 0.0);
const DUMMY_SPAWN: Vec2 = Vec2::new(1.5, 0.0);

/// Player inputs, keyed by the simulated time they are pressed at
const SCRIPT: &[(u64, &[Action], &[Action])] = &[
    (0, &[], &[Action::Attack]),
    (700, &[], &[Action::SkillQ]),
    (1_400, &[], &[Action::SkillW]),
    (2_100, &[], &[Action::SkillE]),
    (2_600, &[Action::MoveLeft], &[]),
    (2_700, &[], &[Action::Attack]),
    (3_400, &[], &[Action::SkillR]),
    (4_200, &[], &[Action::Jump]),
    (4_300, &[], &[Action::Attack]),
    (5_000, &[], &[Action::SkillS]),
];

/// Input for the step that covers `[now, now + dt)`
fn scripted_input(now: u64, dt: u32) -> InputSnapshot {
    SCRIPT
        .iter()
        .find(|(at, _, _)| *at >= now && *at < now + u64::from(dt))
        .map(|(_, held, pressed)| InputSnapshot::from_actions(held, pressed))
        .unwrap_or_default()
}

/// Stand-in for the physics collaborator: ground at y = 0
fn environment(character: &Character) -> EnvironmentSnapshot {
    let grounded = character.position().y <= 0.0 && character.velocity().y <= 0.0;
    if grounded {
        EnvironmentSnapshot::grounded()
    } else {
        EnvironmentSnapshot::airborne(character.velocity().y)
    }
}

fn integrate(character: &mut Character, dt_ms: u32) {
    let dt = dt_ms as f32 / 1000.0;
    let mut velocity = character.velocity();
    let mut position = character.position() + velocity * dt;

    if position.y > 0.0 {
        velocity.y -= GRAVITY * dt;
    } else {
        position.y = 0.0;
        velocity.y = velocity.y.max(0.0);
    }
    character.set_position(position);
    character.set_velocity(velocity);
}

fn load_actions() -> Result<ActionTable> {
    match std::env::args().nth(1) {
        Some(path) => {
            ActionTable::load(&path).with_context(|| format!("loading action table {path}"))
        }
        None => ActionTable::from_ron_str(include_str!("../config/fighter.ron"))
            .context("parsing bundled action table"),
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting Rusted Combat demo...");

    let loadout = Loadout::new(
        load_actions()?,
        ClipLibrary::standard(),
        HandlerRegistry::standard(),
    );

    let mut characters = CharacterManager::new();
    let player = characters.spawn_character(
        "player",
        CharacterStats::standard(),
        loadout.clone(),
        PLAYER_SPAWN,
    );
    let dummy = characters.spawn_character(
        "dummy",
        CharacterStats::standard().with_team(1).with_defense(20),
        loadout,
        DUMMY_SPAWN,
    );

    let mut game_loop = GameLoop::new();
    let dt = game_loop.fixed_timestep_ms();
    let mut now = 0u64;
    let mut total_damage = 0;

    while now < DEMO_LENGTH_MS {
        let steps = game_loop.begin_frame();
        for _ in 0..steps {
            let input = scripted_input(now, dt);
            let hits = characters.update(dt, |c| {
                let input = if c.id == player {
                    input
                } else {
                    InputSnapshot::empty()
                };
                (input, environment(c))
            });
            for hit in &hits {
                total_damage += hit.damage;
                info!(
                    "{} -> {}: {} for {} damage{}",
                    hit.attacker,
                    hit.target,
                    hit.slot,
                    hit.damage,
                    if hit.lethal { " (KO)" } else { "" }
                );
            }

            for character in characters.all_mut() {
                integrate(character, dt);
            }

            for projectile in characters.drain_projectiles() {
                info!(
                    "projectile from {} at ({:.1}, {:.1}), speed {:.1}",
                    projectile.owner,
                    projectile.position.x,
                    projectile.position.y,
                    projectile.velocity.x
                );
            }

            for (id, event) in characters.drain_events() {
                match event {
                    CharacterEvent::ActionStarted { slot } => info!("{id}: {slot}"),
                    CharacterEvent::ActionRejected { slot, reason } => {
                        info!("{id}: {slot} rejected ({reason})")
                    }
                    CharacterEvent::DeathSequenceFinished => {
                        characters.respawn(id, DUMMY_SPAWN);
                    }
                    _ => {}
                }
            }

            // The channel is cut short partway through
            if now == 3_696 {
                if let Some(c) = characters.get_mut(player) {
                    c.stop_channel();
                }
            }

            now += u64::from(dt);
        }
        std::thread::sleep(Duration::from_millis(2));
    }

    if let (Some(p), Some(d)) = (characters.get(player), characters.get(dummy)) {
        info!(
            "Demo finished after {} updates ({}ms simulated): {} damage dealt, player {}hp/{}mp, dummy {}hp",
            game_loop.update_count(),
            now,
            total_damage,
            p.health(),
            p.mana(),
            d.health()
        );
    }

    characters.clear();
    Ok(())
}
