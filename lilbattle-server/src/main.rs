//! LilBattle Game Server
//!
//! Wires storage, cache, screenshot indexer and live sync together and runs a
//! short demo game through the commit path.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use lilbattle::{
    indexer::{NoopRenderer, ScreenshotIndexer, VersionGatedCompletion},
    model::{coord_key, GameConfiguration, GameMove, GamePlayer, MoveType, Position, Tile, Unit},
    rules::TILE_PLAINS,
    service::ListMovesRequest,
    storage::GameStateUpdater,
    sync::{GameSyncService, SyncBroadcastHook},
    BackendGamesService, FileStorage, Game, GameMoveGroup, GameState, GameStorageProvider,
    GamesService, MemoryStorage, ServiceConfig, VERSION,
};

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = ServiceConfig::from_env().context("reading configuration")?;
    info!("LilBattle Server v{}", VERSION);
    info!("Cache enabled: {}", config.cache_enabled);

    let (storage, oracle): (Arc<dyn GameStorageProvider>, Arc<dyn GameStateUpdater>) =
        match &config.storage_dir {
            Some(dir) => {
                info!("File storage at {}", dir.display());
                let storage = Arc::new(
                    FileStorage::new(dir)
                        .await
                        .with_context(|| format!("opening storage at {}", dir.display()))?,
                );
                (storage.clone() as Arc<dyn GameStorageProvider>, storage as Arc<dyn GameStateUpdater>)
            }
            None => {
                info!("In-memory storage");
                let storage = Arc::new(MemoryStorage::new());
                (storage.clone() as Arc<dyn GameStorageProvider>, storage as Arc<dyn GameStateUpdater>)
            }
        };

    let completion = Arc::new(VersionGatedCompletion::new(oracle));
    let (indexer, indexer_task) =
        ScreenshotIndexer::spawn(config.indexer_config(), Arc::new(NoopRenderer), completion);
    let sync = Arc::new(GameSyncService::new(config.sync_channel_capacity));

    let service = BackendGamesService::new(config.cache_enabled)
        .with_storage(storage)
        .with_indexer(Arc::new(indexer))
        .with_post_commit_hook(Arc::new(SyncBroadcastHook::new(sync.clone())));

    demo_game(service, &sync).await?;

    // the service owned the last indexer handle; the worker flushes and exits
    indexer_task.await.context("indexer worker panicked")?;
    info!("Shut down cleanly");
    Ok(())
}

/// Create a two-player game, watch it, commit one move group and list it back.
async fn demo_game(mut service: BackendGamesService, sync: &GameSyncService) -> Result<()> {
    info!("=== Starting Demo Game ===");

    let game = Game {
        name: "Demo Skirmish".into(),
        creator_id: "demo".into(),
        config: GameConfiguration {
            players: vec![
                GamePlayer { player_id: 1, name: "Red".into(), starting_coins: 300, ..Default::default() },
                GamePlayer { player_id: 2, name: "Blue".into(), starting_coins: 300, ..Default::default() },
            ],
            income_configs: None,
        },
        ..Default::default()
    };

    let mut state = GameState::new("");
    state.world_data.set_tile(Tile { q: 0, r: 0, tile_type: TILE_PLAINS, ..Default::default() });
    state.world_data.set_tile(Tile { q: 1, r: 0, tile_type: TILE_PLAINS, ..Default::default() });
    state.world_data.set_unit(Unit { q: 0, r: 0, player: 1, unit_type: 1, ..Default::default() });
    state.world_data.set_unit(Unit { q: 4, r: 0, player: 2, unit_type: 1, ..Default::default() });

    let created = service.create_game(game, state).await?;
    let game_id = created.game.id.clone();
    info!("Created game {} at version {}", game_id, created.state.version);

    let mut viewer = sync.subscribe(&game_id, "spectator").await;
    info!("Spectator joined at sequence {}", viewer.sequence);

    let mut next = created.state;
    next.current_group_number = 1;
    if let Some(mut unit) = next.world_data.units_map.remove(&coord_key(0, 0)) {
        unit.q = 1;
        next.world_data.set_unit(unit);
    }
    let group = GameMoveGroup::new(
        1,
        vec![
            GameMove::new(1, MoveType::MoveUnit { from: Position::new(0, 0), to: Position::new(1, 0) }),
            GameMove::new(1, MoveType::EndTurn),
        ],
    );
    service.save_move_group(&game_id, next, group).await?;

    while let Ok(update) = viewer.receiver.try_recv() {
        info!("Spectator received: {}", update.to_json()?);
    }

    let moves = service
        .list_moves(ListMovesRequest {
            game_id: game_id.clone(),
            ..Default::default()
        })
        .await?;
    let snapshot = service.get_game(&game_id).await?;
    info!(
        "Game {} at version {} with {} move groups",
        game_id,
        snapshot.state.version,
        moves.move_groups.len()
    );

    Ok(())
}
