//! Weapons: three behaviours behind one interface.
//!
//! | Variant | Fire | Update |
//! |---------|------|--------|
//! | [`Weapon::InstantProjectile`] | launches a bolt that damages on contact | cooldown |
//! | [`Weapon::DelayedExplosive`] | launches a rocket that detonates on contact or timeout | cooldown |
//! | [`Weapon::SelfBuff`] | cloaks the actor for a fixed duration | cooldown, buff expiry |
//!
//! Cooldowns tick every frame regardless of whether the weapon is used.
//! Firing while cooling down (or while a buff is already active) is a no-op.
//!
//! Actors carry an [`Armament`] of three slots and are commanded through
//! [`FireWeapon`] messages; the input layer never touches weapon state
//! directly.

use crate::collision::{ASTEROID_GROUPS, PROJECTILE_GROUP};
use crate::config::{BlasterConfig, CloakConfig, CombatConfig, RocketConfig};
use crate::simulation::CombatSet;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

// ── Cooldown ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    duration: f32,
    remaining: f32,
}

impl Cooldown {
    /// A ready cooldown of `duration` seconds.
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            remaining: 0.0,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }

    #[inline]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn trigger(&mut self) {
        self.remaining = self.duration;
    }

    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    /// `0.0` just after firing, `1.0` when ready.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (1.0 - self.remaining / self.duration).clamp(0.0, 1.0)
    }
}

// ── Weapon variants ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectileKind {
    /// Direct-damage shot.
    Bolt,
    /// Area shot; detonates instead of dealing direct damage.
    Rocket,
}

/// Everything needed to spawn one projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileLaunch {
    pub kind: ProjectileKind,
    pub origin: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    pub lifetime: f32,
    pub blast_radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireOutcome {
    Launch(ProjectileLaunch),
    Cloak { alpha: f32, duration: f32 },
}

/// State changes reported by [`Weapon::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponTick {
    CloakExpired,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileWeapon {
    pub damage: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub cooldown: Cooldown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosiveWeapon {
    pub damage: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub blast_radius: f32,
    pub cooldown: Cooldown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuffWeapon {
    pub duration: f32,
    pub alpha: f32,
    pub cooldown: Cooldown,
    active_remaining: Option<f32>,
}

impl BuffWeapon {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active_remaining.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weapon {
    InstantProjectile(ProjectileWeapon),
    DelayedExplosive(ExplosiveWeapon),
    SelfBuff(BuffWeapon),
}

impl Weapon {
    pub fn blaster(config: &BlasterConfig) -> Self {
        Weapon::InstantProjectile(ProjectileWeapon {
            damage: config.damage,
            projectile_speed: config.projectile_speed,
            projectile_lifetime: config.projectile_lifetime,
            cooldown: Cooldown::new(config.cooldown_secs),
        })
    }

    pub fn rocket_launcher(config: &RocketConfig) -> Self {
        Weapon::DelayedExplosive(ExplosiveWeapon {
            damage: config.damage,
            projectile_speed: config.projectile_speed,
            projectile_lifetime: config.projectile_lifetime,
            blast_radius: config.blast_radius,
            cooldown: Cooldown::new(config.cooldown_secs),
        })
    }

    pub fn cloaking_device(config: &CloakConfig) -> Self {
        Weapon::SelfBuff(BuffWeapon {
            duration: config.duration_secs,
            alpha: config.alpha,
            cooldown: Cooldown::new(config.cooldown_secs),
            active_remaining: None,
        })
    }

    fn cooldown(&self) -> &Cooldown {
        match self {
            Weapon::InstantProjectile(w) => &w.cooldown,
            Weapon::DelayedExplosive(w) => &w.cooldown,
            Weapon::SelfBuff(w) => &w.cooldown,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        match self {
            Weapon::SelfBuff(w) => w.cooldown.is_ready() && !w.is_active(),
            other => other.cooldown().is_ready(),
        }
    }

    /// For the HUD: `1.0` when ready.
    pub fn cooldown_progress(&self) -> f32 {
        self.cooldown().progress()
    }

    /// Fire from `origin` toward `direction`.
    ///
    /// Returns `None` (and leaves the cooldown untouched) when not ready, or
    /// when a projectile weapon is given a zero direction.
    pub fn fire(&mut self, origin: Vec2, direction: Vec2) -> Option<FireOutcome> {
        if !self.is_ready() {
            return None;
        }
        match self {
            Weapon::InstantProjectile(w) => {
                let dir = direction.try_normalize()?;
                w.cooldown.trigger();
                Some(FireOutcome::Launch(ProjectileLaunch {
                    kind: ProjectileKind::Bolt,
                    origin,
                    velocity: dir * w.projectile_speed,
                    damage: w.damage,
                    lifetime: w.projectile_lifetime,
                    blast_radius: 0.0,
                }))
            }
            Weapon::DelayedExplosive(w) => {
                let dir = direction.try_normalize()?;
                w.cooldown.trigger();
                Some(FireOutcome::Launch(ProjectileLaunch {
                    kind: ProjectileKind::Rocket,
                    origin,
                    velocity: dir * w.projectile_speed,
                    damage: w.damage,
                    lifetime: w.projectile_lifetime,
                    blast_radius: w.blast_radius,
                }))
            }
            Weapon::SelfBuff(w) => {
                w.cooldown.trigger();
                w.active_remaining = Some(w.duration);
                Some(FireOutcome::Cloak {
                    alpha: w.alpha,
                    duration: w.duration,
                })
            }
        }
    }

    /// Advance timers by `dt`.
    pub fn update(&mut self, dt: f32) -> Option<WeaponTick> {
        match self {
            Weapon::InstantProjectile(w) => {
                w.cooldown.tick(dt);
                None
            }
            Weapon::DelayedExplosive(w) => {
                w.cooldown.tick(dt);
                None
            }
            Weapon::SelfBuff(w) => {
                w.cooldown.tick(dt);
                let remaining = w.active_remaining? - dt;
                if remaining <= 0.0 {
                    w.active_remaining = None;
                    Some(WeaponTick::CloakExpired)
                } else {
                    w.active_remaining = Some(remaining);
                    None
                }
            }
        }
    }
}

// ── Armament ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponSlot {
    Primary,
    Secondary,
    Special,
}

impl WeaponSlot {
    pub const ALL: [WeaponSlot; 3] = [WeaponSlot::Primary, WeaponSlot::Secondary, WeaponSlot::Special];
}

/// The weapons an actor carries, one per slot.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Armament {
    pub primary: Weapon,
    pub secondary: Weapon,
    pub special: Weapon,
}

impl Armament {
    /// Blaster, rocket launcher, cloaking device.
    pub fn from_config(config: &CombatConfig) -> Self {
        Self {
            primary: Weapon::blaster(&config.blaster),
            secondary: Weapon::rocket_launcher(&config.rocket),
            special: Weapon::cloaking_device(&config.cloak),
        }
    }

    pub fn slot(&self, slot: WeaponSlot) -> &Weapon {
        match slot {
            WeaponSlot::Primary => &self.primary,
            WeaponSlot::Secondary => &self.secondary,
            WeaponSlot::Special => &self.special,
        }
    }

    pub fn slot_mut(&mut self, slot: WeaponSlot) -> &mut Weapon {
        match slot {
            WeaponSlot::Primary => &mut self.primary,
            WeaponSlot::Secondary => &mut self.secondary,
            WeaponSlot::Special => &mut self.special,
        }
    }
}

// ── Projectiles ───────────────────────────────────────────────────────────────

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub damage: f32,
    /// Seconds left before the projectile dissolves on its own.
    pub lifetime: f32,
    pub blast_radius: f32,
    /// The actor that fired it.
    pub source: Entity,
    dissolving: bool,
}

impl Projectile {
    pub fn new(
        source: Entity,
        kind: ProjectileKind,
        damage: f32,
        lifetime: f32,
        blast_radius: f32,
    ) -> Self {
        Self {
            kind,
            damage,
            lifetime,
            blast_radius,
            source,
            dissolving: false,
        }
    }

    pub fn from_launch(source: Entity, launch: &ProjectileLaunch) -> Self {
        Self::new(
            source,
            launch.kind,
            launch.damage,
            launch.lifetime,
            launch.blast_radius,
        )
    }

    #[inline]
    pub fn is_dissolving(&self) -> bool {
        self.dissolving
    }

    /// Mark the projectile spent.  Returns `false` if it already was.
    pub fn dissolve(&mut self) -> bool {
        !std::mem::replace(&mut self.dissolving, true)
    }

    /// Damage to apply on contact; `fallback` when no payload is set.
    pub fn payload(&self, fallback: f32) -> f32 {
        if self.damage > 0.0 {
            self.damage
        } else {
            fallback
        }
    }
}

/// Translucency applied while the cloak is engaged.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Cloaked {
    pub alpha: f32,
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// Command from the input layer (or an autopilot) to fire one slot.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct FireWeapon {
    pub actor: Entity,
    pub slot: WeaponSlot,
    /// World-space aim direction; the actor's facing (+Y rotated) when `None`.
    pub aim: Option<Vec2>,
}

/// A fire command that was accepted.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct WeaponFired {
    pub actor: Entity,
    pub slot: WeaponSlot,
    /// The launched projectile; `None` for buffs.
    pub projectile: Option<Entity>,
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct ProjectileDissolved {
    pub projectile: Entity,
    pub kind: ProjectileKind,
    pub position: Vec2,
}

/// A rocket went off.  Area damage is left to whoever consumes this.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct Detonation {
    pub source: Entity,
    pub position: Vec2,
    pub damage: f32,
    pub radius: f32,
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct CloakChanged {
    pub actor: Entity,
    pub active: bool,
    pub alpha: f32,
}

/// Retires projectiles: dissolve, despawn and (for rockets) detonate.
#[derive(SystemParam)]
pub struct ProjectileSink<'w, 's> {
    commands: Commands<'w, 's>,
    dissolved: MessageWriter<'w, ProjectileDissolved>,
    detonations: MessageWriter<'w, Detonation>,
}

impl ProjectileSink<'_, '_> {
    /// Returns `false` if the projectile had already been retired.
    pub fn finish(&mut self, entity: Entity, projectile: &mut Projectile, position: Vec2) -> bool {
        if !projectile.dissolve() {
            return false;
        }
        if projectile.kind == ProjectileKind::Rocket {
            self.detonations.write(Detonation {
                source: projectile.source,
                position,
                damage: projectile.damage,
                radius: projectile.blast_radius,
            });
        }
        self.dissolved.write(ProjectileDissolved {
            projectile: entity,
            kind: projectile.kind,
            position,
        });
        self.commands.entity(entity).try_despawn();
        true
    }
}

/// Spawn the physics body for a launched projectile.
pub fn spawn_projectile(
    commands: &mut Commands,
    config: &CombatConfig,
    source: Entity,
    launch: &ProjectileLaunch,
) -> Entity {
    let heading = launch.velocity.to_angle() - std::f32::consts::FRAC_PI_2;
    commands
        .spawn((
            Projectile::from_launch(source, launch),
            Transform::from_translation(launch.origin.extend(0.0))
                .with_rotation(Quat::from_rotation_z(heading)),
            RigidBody::KinematicVelocityBased,
            Velocity::linear(launch.velocity),
            Collider::ball(config.projectile_collider_radius),
            Sensor,
            Ccd::enabled(),
            CollisionGroups::new(PROJECTILE_GROUP, ASTEROID_GROUPS),
            ActiveCollisionTypes::DYNAMIC_KINEMATIC,
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Tick every slot of every armament; lift expired cloaks.
pub fn weapon_cooldown_system(
    mut commands: Commands,
    time: Res<Time>,
    mut q_armed: Query<(Entity, &mut Armament)>,
    mut cloak_changes: MessageWriter<CloakChanged>,
) {
    let dt = time.delta_secs();
    for (actor, mut armament) in q_armed.iter_mut() {
        for slot in WeaponSlot::ALL {
            if armament.slot_mut(slot).update(dt) == Some(WeaponTick::CloakExpired) {
                commands.entity(actor).remove::<Cloaked>();
                cloak_changes.write(CloakChanged {
                    actor,
                    active: false,
                    alpha: 1.0,
                });
                debug!("Cloak on {actor:?} expired");
            }
        }
    }
}

/// Turn [`FireWeapon`] commands into projectiles and buffs.
pub fn weapon_fire_system(
    mut commands: Commands,
    mut requests: MessageReader<FireWeapon>,
    mut q_armed: Query<(&Transform, &mut Armament)>,
    config: Res<CombatConfig>,
    mut fired: MessageWriter<WeaponFired>,
    mut cloak_changes: MessageWriter<CloakChanged>,
) {
    for request in requests.read() {
        let Ok((transform, mut armament)) = q_armed.get_mut(request.actor) else {
            continue;
        };
        let facing = transform.rotation.mul_vec3(Vec3::Y).truncate();
        let direction = request
            .aim
            .and_then(Vec2::try_normalize)
            .unwrap_or(facing);
        let origin = transform.translation.truncate() + direction * config.muzzle_offset;

        let projectile = match armament.slot_mut(request.slot).fire(origin, direction) {
            Some(FireOutcome::Launch(launch)) => {
                Some(spawn_projectile(&mut commands, &config, request.actor, &launch))
            }
            Some(FireOutcome::Cloak { alpha, duration }) => {
                commands.entity(request.actor).insert(Cloaked { alpha });
                cloak_changes.write(CloakChanged {
                    actor: request.actor,
                    active: true,
                    alpha,
                });
                debug!("Cloak on {:?} engaged for {duration:.1}s", request.actor);
                None
            }
            None => continue,
        };
        fired.write(WeaponFired {
            actor: request.actor,
            slot: request.slot,
            projectile,
        });
    }
}

/// Age projectiles; dissolve the ones that run out.
pub fn projectile_lifetime_system(
    time: Res<Time>,
    mut q_projectiles: Query<(Entity, &mut Projectile, &Transform)>,
    mut sink: ProjectileSink,
) {
    let dt = time.delta_secs();
    for (entity, mut projectile, transform) in q_projectiles.iter_mut() {
        if projectile.is_dissolving() {
            continue;
        }
        projectile.lifetime -= dt;
        if projectile.lifetime <= 0.0 {
            sink.finish(entity, &mut projectile, transform.translation.truncate());
        }
    }
}

pub struct WeaponPlugin;

impl Plugin for WeaponPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<FireWeapon>()
            .add_message::<WeaponFired>()
            .add_message::<ProjectileDissolved>()
            .add_message::<Detonation>()
            .add_message::<CloakChanged>()
            .add_systems(
                Update,
                (
                    weapon_cooldown_system,
                    weapon_fire_system,
                    projectile_lifetime_system,
                )
                    .chain()
                    .in_set(CombatSet::Arm),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{quiet_config, record_messages, recorded, test_app};

    #[test]
    fn blaster_cooldown_gates_fire() {
        let mut blaster = Weapon::blaster(&BlasterConfig::default());
        assert!(blaster.fire(Vec2::ZERO, Vec2::Y).is_some());
        blaster.update(0.1);
        assert!(blaster.fire(Vec2::ZERO, Vec2::Y).is_none());
        blaster.update(0.201);
        assert!(blaster.fire(Vec2::ZERO, Vec2::Y).is_some());
    }

    #[test]
    fn blaster_launches_along_direction() {
        let mut blaster = Weapon::blaster(&BlasterConfig::default());
        let Some(FireOutcome::Launch(launch)) = blaster.fire(Vec2::ONE, Vec2::new(0.0, 2.0)) else {
            panic!("blaster should launch");
        };
        assert_eq!(launch.kind, ProjectileKind::Bolt);
        assert_eq!(launch.origin, Vec2::ONE);
        assert_eq!(launch.velocity, Vec2::new(0.0, 600.0));
        assert_eq!(launch.damage, 10.0);
    }

    #[test]
    fn zero_direction_does_not_consume_cooldown() {
        let mut rockets = Weapon::rocket_launcher(&RocketConfig::default());
        assert!(rockets.fire(Vec2::ZERO, Vec2::ZERO).is_none());
        assert!(rockets.is_ready());
    }

    #[test]
    fn progress_runs_from_zero_to_one() {
        let mut rockets = Weapon::rocket_launcher(&RocketConfig::default());
        assert_eq!(rockets.cooldown_progress(), 1.0);
        rockets.fire(Vec2::ZERO, Vec2::X);
        assert_eq!(rockets.cooldown_progress(), 0.0);
        rockets.update(0.5);
        assert!((rockets.cooldown_progress() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn cloak_expires_after_duration() {
        let mut cloak = Weapon::cloaking_device(&CloakConfig {
            cooldown_secs: 12.0,
            duration_secs: 5.0,
            alpha: 0.2,
        });
        assert_eq!(
            cloak.fire(Vec2::ZERO, Vec2::ZERO),
            Some(FireOutcome::Cloak {
                alpha: 0.2,
                duration: 5.0
            })
        );
        assert_eq!(cloak.update(4.0), None);
        assert_eq!(cloak.update(1.5), Some(WeaponTick::CloakExpired));
        assert_eq!(cloak.update(1.0), None);
        // Still cooling down after the buff ended.
        assert!(cloak.fire(Vec2::ZERO, Vec2::ZERO).is_none());
        cloak.update(6.0);
        assert!(cloak.fire(Vec2::ZERO, Vec2::ZERO).is_some());
    }

    #[test]
    fn cloak_cannot_stack_while_active() {
        let mut cloak = Weapon::cloaking_device(&CloakConfig {
            cooldown_secs: 0.0,
            duration_secs: 5.0,
            alpha: 0.2,
        });
        assert!(cloak.fire(Vec2::ZERO, Vec2::ZERO).is_some());
        assert!(cloak.fire(Vec2::ZERO, Vec2::ZERO).is_none());
    }

    #[test]
    fn payload_falls_back_when_unset() {
        let bolt = Projectile::new(Entity::PLACEHOLDER, ProjectileKind::Bolt, 0.0, 1.0, 0.0);
        assert_eq!(bolt.payload(10.0), 10.0);
        let mut hot = Projectile::new(Entity::PLACEHOLDER, ProjectileKind::Bolt, 25.0, 1.0, 0.0);
        assert_eq!(hot.payload(10.0), 25.0);
        assert!(hot.dissolve());
        assert!(!hot.dissolve());
    }

    #[test]
    fn fire_command_spawns_projectile_once_per_cooldown() {
        let mut app = test_app(quiet_config());
        record_messages::<WeaponFired>(&mut app);
        let config = app.world().resource::<CombatConfig>().clone();
        let actor = app
            .world_mut()
            .spawn((Armament::from_config(&config), Transform::default()))
            .id();

        for _ in 0..2 {
            app.world_mut().write_message(FireWeapon {
                actor,
                slot: WeaponSlot::Primary,
                aim: Some(Vec2::X),
            });
        }
        app.update();

        let fired = recorded::<WeaponFired>(&app).to_vec();
        assert_eq!(fired.len(), 1);
        assert!(fired[0].projectile.is_some());
        let mut q = app.world_mut().query::<(&Projectile, &Transform)>();
        let shots: Vec<_> = q.iter(app.world()).collect();
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].0.source, actor);
        assert_eq!(shots[0].1.translation.truncate(), Vec2::X * config.muzzle_offset);
    }

    #[test]
    fn expired_projectile_dissolves_and_rocket_detonates() {
        let mut app = test_app(quiet_config());
        record_messages::<ProjectileDissolved>(&mut app);
        record_messages::<Detonation>(&mut app);

        let rocket = Projectile::new(Entity::PLACEHOLDER, ProjectileKind::Rocket, 50.0, 0.15, 80.0);
        let entity = app.world_mut().spawn((rocket, Transform::default())).id();

        app.update(); // zero step
        app.update(); // 0.1
        assert!(app.world().get_entity(entity).is_ok());
        app.update(); // 0.2

        assert!(app.world().get_entity(entity).is_err());
        assert_eq!(recorded::<ProjectileDissolved>(&app).len(), 1);
        assert_eq!(recorded::<Detonation>(&app).len(), 1);
    }

    #[test]
    fn cloak_toggles_component() {
        let mut app = test_app(quiet_config());
        record_messages::<CloakChanged>(&mut app);
        let mut config = app.world().resource::<CombatConfig>().clone();
        config.cloak.duration_secs = 0.15;
        let actor = app
            .world_mut()
            .spawn((Armament::from_config(&config), Transform::default()))
            .id();

        app.world_mut().write_message(FireWeapon {
            actor,
            slot: WeaponSlot::Special,
            aim: None,
        });
        app.update();
        assert_eq!(app.world().get::<Cloaked>(actor), Some(&Cloaked { alpha: 0.2 }));

        app.update();
        app.update();
        assert!(app.world().get::<Cloaked>(actor).is_none());
        let changes = recorded::<CloakChanged>(&app);
        assert_eq!(changes.len(), 2);
        assert!(changes[0].active);
        assert!(!changes[1].active);
    }
}
