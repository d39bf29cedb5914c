pub mod save;

pub use save::{
    list_saves, load_latest_valid_save, load_save, prune_saves, save_game, write_save, SaveError,
    SaveFile, SaveFormat, SaveMetadata, SAVE_VERSION,
};
