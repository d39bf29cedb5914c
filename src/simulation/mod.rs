pub mod camera;
pub mod clock;
pub mod events;
pub mod input;
pub mod statistics;
pub mod weather;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::generation::WorldGenParams;
use crate::config::simulation::SimulationConfig;
use crate::crafting::{self, CraftError, RecipeBook};
use crate::inventory::{Inventory, WearOutcome};
use crate::items::{ItemCategory, ItemRegistry};
use crate::player::{Ambient, DecayRates, PlayerState};
use crate::world::generation::generate_world;
use crate::world::{RegenPolicy, TerrainType, TileCoord, World};

pub use camera::Camera;
pub use clock::{DayClock, TimeOfDay};
pub use events::{GameEvent, Panel, Severity};
pub use input::{Action, ActionError, Direction, parse_action};
pub use statistics::{GameStatistics, compute_statistics};
pub use weather::Weather;

/// Health is reported in bands of this width when it drains.
const HEALTH_REPORT_BAND: f32 = 10.0;

/// Result of one `Game::advance` call.
#[derive(Debug, Clone, Default)]
pub struct TickResult {
    pub events: Vec<GameEvent>,
    /// Number of fixed steps executed this frame.
    pub steps: u32,
    pub autosave_due: bool,
}

/// A running game: one world, one player, one inventory, driven by fixed steps.
#[derive(Debug, Clone)]
pub struct Game {
    pub world: World,
    pub player: PlayerState,
    pub inventory: Inventory,
    pub items: ItemRegistry,
    pub recipes: RecipeBook,
    pub config: SimulationConfig,
    pub clock: DayClock,
    pub weather: Weather,
    pub camera: Camera,
    pub tick: u64,
    pub inventory_open: bool,
    pub crafting_open: bool,
    /// Last movement direction; harvesting reaches one tile this way.
    pub facing: Direction,
    seed: u64,
    rng: ChaCha8Rng,
    accumulator: f32,
    spawn_timer: f32,
    autosave_timer: f32,
    pending: Vec<GameEvent>,
}

impl Game {
    pub fn new(
        mut world: World,
        player: PlayerState,
        inventory: Inventory,
        items: ItemRegistry,
        recipes: RecipeBook,
        config: SimulationConfig,
        seed: u64,
    ) -> Self {
        world.regen_policy = regen_policy(&config);
        let clock = DayClock::new(config.day_length_secs, config.start_day_fraction);
        let mut camera = Camera::new(Vec2::new(config.viewport_width, config.viewport_height));
        camera.follow(player.position, world.pixel_size());
        Self {
            world,
            player,
            inventory,
            items,
            recipes,
            config,
            clock,
            weather: Weather::default(),
            camera,
            tick: 0,
            inventory_open: false,
            crafting_open: false,
            facing: Direction::Down,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            accumulator: 0.0,
            spawn_timer: 0.0,
            autosave_timer: 0.0,
            pending: Vec::new(),
        }
    }

    /// Generate a world and place a fresh player at the walkable tile nearest its centre.
    pub fn new_game(
        params: &WorldGenParams,
        config: SimulationConfig,
        items: ItemRegistry,
        recipes: RecipeBook,
    ) -> Result<Self, ActionError> {
        let world = generate_world(params);
        let spawn = world.find_spawn_point().ok_or(ActionError::NoSpawnPoint)?;
        let player = PlayerState::new(spawn, config.player_speed);
        let inventory = Inventory::new(config.inventory_capacity);
        let seed = world.seed();
        info!(seed, x = spawn.x, y = spawn.y, "New game started");
        Ok(Self::new(world, player, inventory, items, recipes, config, seed))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restore clock, weather and tick from a save and reseed the RNG from them.
    pub fn resume_at(&mut self, tick: u64, game_time: f64, weather: Weather) {
        self.tick = tick;
        self.clock.elapsed = game_time;
        self.weather = weather;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(tick));
        self.camera.follow(self.player.position, self.world.pixel_size());
    }

    /// Feed real frame time and run as many fixed steps as it covers.
    ///
    /// At most `max_steps_per_frame` steps run; any further backlog is dropped.
    pub fn advance(&mut self, frame_dt: f32) -> TickResult {
        let step_dt = self.config.step_secs();
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }

        let mut result = TickResult {
            events: std::mem::take(&mut self.pending),
            ..Default::default()
        };
        while self.accumulator >= step_dt && result.steps < self.config.max_steps_per_frame {
            self.accumulator -= step_dt;
            result.events.extend(self.step(step_dt));
            result.steps += 1;
        }
        if self.accumulator >= step_dt {
            debug!(backlog_secs = self.accumulator, "Dropping simulation backlog");
            self.accumulator %= step_dt;
        }

        result.autosave_due = result
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::AutosaveDue { .. }));
        result
    }

    /// Run one fixed step of `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !(dt.is_finite() && dt > 0.0) {
            return events;
        }
        self.tick += 1;

        let ambient = self.ambient();
        let rates = self.decay_rates();
        let health_before = self.player.vitals.health;
        let player_tick = self.player.update(dt, &self.world, &rates, ambient);
        for effect in player_tick.gained {
            debug!(?effect, "Status gained");
            events.push(GameEvent::StatusGained { effect });
        }
        for effect in player_tick.lost {
            debug!(?effect, "Status lost");
            events.push(GameEvent::StatusLost { effect });
        }
        let health = self.player.vitals.health;
        if health < health_before
            && (health / HEALTH_REPORT_BAND).ceil() < (health_before / HEALTH_REPORT_BAND).ceil()
        {
            events.push(GameEvent::PlayerDamaged {
                amount: health_before - health,
                health,
            });
        }
        if player_tick.died {
            warn!(tick = self.tick, day = self.clock.day(), "Player died");
            events.push(GameEvent::PlayerDied);
        }

        self.camera.follow(self.player.position, self.world.pixel_size());

        for spawned in self.world.update(dt, &mut self.rng) {
            events.push(GameEvent::ResourceSpawned {
                coord: spawned.coord,
                resource: spawned.resource,
                amount: spawned.amount,
                regenerated: true,
            });
        }
        self.run_spawner(dt, &mut events);

        for (from, to) in self.clock.advance(dt) {
            info!(day = self.clock.day(), ?from, ?to, "Time of day changed");
            events.push(GameEvent::TimeOfDayChanged {
                from,
                to,
                day: self.clock.day(),
                light_level: self.clock.light_level(),
                overlay_alpha: to.overlay_alpha(),
                ambient_track: to.ambient_track(),
            });
        }

        if let Some(next) =
            self.weather
                .maybe_change(dt, self.config.weather_change_chance_per_sec, &mut self.rng)
        {
            info!(from = self.weather.name(), to = next.name(), "Weather changed");
            events.push(GameEvent::WeatherChanged {
                from: self.weather,
                to: next,
            });
            self.weather = next;
        }

        if self.config.autosave_interval_secs > 0.0 {
            self.autosave_timer += dt;
            if self.autosave_timer >= self.config.autosave_interval_secs {
                self.autosave_timer = 0.0;
                events.push(GameEvent::AutosaveDue { tick: self.tick });
            }
        }

        events
    }

    /// Apply one player action.
    ///
    /// Failures leave the game unchanged and are also queued as events for
    /// the next `advance`.
    pub fn apply(&mut self, action: Action) -> Result<Vec<GameEvent>, ActionError> {
        let needs_living = matches!(
            action,
            Action::Move(_) | Action::Harvest | Action::UseSelected | Action::Craft(_)
        );
        if needs_living && self.player.is_dead() {
            return self.fail(ActionError::PlayerDead);
        }

        match action {
            Action::Move(direction) => {
                self.facing = direction;
                self.set_direction(direction, true);
                self.set_direction(direction.opposite(), false);
                Ok(Vec::new())
            }
            Action::StopMoving => {
                self.player.input = Default::default();
                Ok(Vec::new())
            }
            Action::Harvest => self.harvest(),
            Action::ToggleInventory => {
                self.inventory_open = !self.inventory_open;
                Ok(vec![GameEvent::PanelToggled {
                    panel: Panel::Inventory,
                    open: self.inventory_open,
                }])
            }
            Action::ToggleCrafting => {
                self.crafting_open = !self.crafting_open;
                Ok(vec![GameEvent::PanelToggled {
                    panel: Panel::Crafting,
                    open: self.crafting_open,
                }])
            }
            Action::SelectSlot(slot) => {
                if !self.inventory.select_slot(slot) {
                    return self.fail(ActionError::InvalidSlot(slot));
                }
                Ok(vec![GameEvent::SelectionChanged { slot }])
            }
            Action::CycleSelection(delta) => {
                let slot = self.inventory.cycle_selection(delta);
                Ok(vec![GameEvent::SelectionChanged { slot }])
            }
            Action::UseSelected => self.use_selected(),
            Action::Craft(recipe_id) => self.craft(&recipe_id),
        }
    }

    /// Replace the world with a fresh one from the same parameters.
    ///
    /// Pending regeneration on the old world is cancelled, the player respawns
    /// with full vitals and an empty inventory. Returns the number of
    /// cancelled regeneration events.
    pub fn restart(&mut self) -> Result<usize, ActionError> {
        let world = generate_world(&self.world.generation_params);
        let spawn = world.find_spawn_point().ok_or(ActionError::NoSpawnPoint)?;
        let cancelled = self.replace_world(world);
        self.player = PlayerState::new(spawn, self.config.player_speed);
        self.inventory = Inventory::new(self.config.inventory_capacity);
        self.camera.follow(self.player.position, self.world.pixel_size());
        info!(cancelled, "Game restarted");
        Ok(cancelled)
    }

    /// Swap in a different world, dropping the old world's scheduled regeneration.
    pub fn replace_world(&mut self, mut world: World) -> usize {
        let cancelled = self.world.cancel_regeneration();
        world.regen_policy = regen_policy(&self.config);
        self.world = world;
        self.spawn_timer = 0.0;
        cancelled
    }

    pub fn statistics(&self) -> GameStatistics {
        compute_statistics(
            self.tick,
            &self.clock,
            self.weather,
            &self.world,
            &self.player,
            &self.inventory,
        )
    }

    /// Events queued by failed actions that no `advance` has returned yet.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    /// The node under the player, or failing that the one on the faced tile.
    ///
    /// Water is never walkable, so fish are only reachable from the shore.
    fn harvest_target(&self) -> Option<TileCoord> {
        let position = self.player.position;
        let here = self.world.tile_coord(position.x, position.y)?;
        if self.world.node(here).is_some() {
            return Some(here);
        }
        let (dx, dy) = self.facing.offset();
        let ahead = TileCoord::new(
            here.x.checked_add_signed(dx)?,
            here.y.checked_add_signed(dy)?,
        );
        self.world.node(ahead).map(|n| n.coord)
    }

    fn harvest(&mut self) -> Result<Vec<GameEvent>, ActionError> {
        let Some(coord) = self.harvest_target() else {
            return self.fail(ActionError::NothingToHarvest);
        };
        let Some(node) = self.world.node(coord) else {
            return self.fail(ActionError::NothingToHarvest);
        };
        let item_id = node.resource.item_id();
        let Some(stack) = self.items.stack(item_id, 1) else {
            return self.fail(ActionError::UnknownItem(item_id.to_string()));
        };
        if !self.inventory.can_accept(&stack, 1) {
            self.pending.push(GameEvent::InventoryFull {
                item_id: item_id.to_string(),
            });
            return self.fail(ActionError::InventoryFull {
                item_id: item_id.to_string(),
            });
        }

        let Some(resource) = self.world.harvest_tile(coord, &mut self.rng) else {
            return self.fail(ActionError::NothingToHarvest);
        };
        self.inventory.add_item(stack);
        let remaining = self.world.node(coord).map_or(0, |n| n.amount);
        debug!(x = coord.x, y = coord.y, ?resource, remaining, "Harvested");

        let mut events = vec![GameEvent::ResourceHarvested {
            coord,
            resource,
            item_id: item_id.to_string(),
            remaining,
        }];
        if self.selected_is_tool() {
            if let WearOutcome::Broke { item_id } = self.inventory.wear_selected(1) {
                info!(item = %item_id, "Tool broke");
                events.push(GameEvent::ToolBroke { item_id });
            }
        }
        Ok(events)
    }

    fn use_selected(&mut self) -> Result<Vec<GameEvent>, ActionError> {
        let Some(selected) = self.inventory.selected() else {
            return self.fail(ActionError::NothingSelected);
        };
        let item_id = selected.item_id.clone();
        let (consumable, nutrition, hydration) = match self.items.get(&item_id) {
            Some(def) => (
                def.is_consumable(),
                def.nutrition.unwrap_or(0.0),
                def.hydration.unwrap_or(0.0),
            ),
            None => return self.fail(ActionError::UnknownItem(item_id)),
        };
        if !consumable {
            return self.fail(ActionError::NotConsumable(item_id));
        }

        let slot = self.inventory.selected_index();
        if let Err(e) = self.inventory.remove_item(slot, 1) {
            return self.fail(e.into());
        }
        let hunger_restored = self.player.eat(nutrition);
        let thirst_restored = self.player.drink(hydration);
        debug!(item = %item_id, hunger_restored, thirst_restored, "Consumed");
        Ok(vec![GameEvent::ItemConsumed {
            item_id,
            hunger_restored,
            thirst_restored,
        }])
    }

    fn craft(&mut self, recipe_id: &str) -> Result<Vec<GameEvent>, ActionError> {
        let outcome = crafting::craft_by_id(
            &mut self.inventory,
            &self.items,
            &self.recipes,
            recipe_id,
            self.config.match_mode(),
        );
        match outcome {
            Ok(outcome) => Ok(vec![GameEvent::ItemCrafted {
                recipe_id: outcome.recipe_id,
                item_id: outcome.item_id,
                count: outcome.count,
            }]),
            Err(e) => {
                if let CraftError::InventoryFull { item_id } = &e {
                    self.pending.push(GameEvent::InventoryFull {
                        item_id: item_id.clone(),
                    });
                }
                self.pending.push(GameEvent::CraftFailed {
                    recipe_id: recipe_id.to_string(),
                    reason: e.to_string(),
                });
                self.fail(e.into())
            }
        }
    }

    fn fail(&mut self, error: ActionError) -> Result<Vec<GameEvent>, ActionError> {
        debug!(error = %error, "Action rejected");
        self.pending
            .push(GameEvent::notify(Severity::Warning, error.to_string()));
        Err(error)
    }

    fn selected_is_tool(&self) -> bool {
        self.inventory
            .selected()
            .and_then(|s| self.items.get(&s.item_id))
            .is_some_and(|def| def.category == ItemCategory::Tool)
    }

    fn set_direction(&mut self, direction: Direction, held: bool) {
        let input = &mut self.player.input;
        match direction {
            Direction::Up => input.up = held,
            Direction::Down => input.down = held,
            Direction::Left => input.left = held,
            Direction::Right => input.right = held,
        }
    }

    fn run_spawner(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let interval = self.config.resource_spawn_interval_secs;
        if interval <= 0.0 {
            return;
        }
        self.spawn_timer += dt;
        while self.spawn_timer >= interval {
            self.spawn_timer -= interval;
            for _ in 0..self.config.spawn_attempts {
                if let Some(spawned) = self.world.spawn_random_resource(&mut self.rng) {
                    debug!(
                        x = spawned.coord.x,
                        y = spawned.coord.y,
                        resource = ?spawned.resource,
                        "Resource spawned"
                    );
                    events.push(GameEvent::ResourceSpawned {
                        coord: spawned.coord,
                        resource: spawned.resource,
                        amount: spawned.amount,
                        regenerated: false,
                    });
                }
            }
        }
    }

    /// Exposure at the player's position: cold at night or in snow and storms,
    /// hot on open sand under a clear daytime sky.
    fn ambient(&self) -> Ambient {
        let phase = self.clock.time_of_day();
        let on_sand = self
            .world
            .tile_coord(self.player.position.x, self.player.position.y)
            .and_then(|c| self.world.tile(c))
            .is_some_and(|t| t.terrain == TerrainType::Sand);
        Ambient {
            cold: phase == TimeOfDay::Night || self.weather.is_cold(),
            heat: phase == TimeOfDay::Day && self.weather == Weather::Clear && on_sand,
        }
    }

    fn decay_rates(&self) -> DecayRates {
        DecayRates {
            hunger_per_sec: self.config.hunger_decay_per_sec,
            thirst_per_sec: self.config.thirst_decay_per_sec,
            starvation_per_sec: self.config.starvation_damage_per_sec,
        }
    }
}

fn regen_policy(config: &SimulationConfig) -> RegenPolicy {
    RegenPolicy {
        chance: config.regen_chance,
        delay_min_secs: config.regen_delay_min_secs,
        delay_max_secs: config.regen_delay_max_secs,
    }
}
