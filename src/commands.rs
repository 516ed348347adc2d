//! Admin Commands
//!
//! Parses the command line into a [`Command`] and runs it against a store.
//! Every command returns the text to print; errors are flattened to strings
//! at this boundary.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use pico_args::Arguments;

use folio_core::collection::photos_by_category;
use folio_core::domain::{Category, HomeImage, NewPhoto, Photo, PhotoId};
use folio_core::{CollectionError, CollectionManager, HomeImageStore, PortfolioStore, SyncState};

use crate::config::AdminConfig;
use crate::view_state::{AdminViewState, ViewMode};

pub const USAGE: &str = "\
folio-admin [--config <path>] [--list] [--verbose] <command>

Commands:
  list [<category>...]              Show categories in admin order
  move <category> <id> <index>      Drag a photo to a new slot
  delete <category> (--all | <id>...)
                                    Soft-delete photos
  register <category> <name> <url>  Add an uploaded photo at the end
  home-image <category> <url>       Set a category's home page image
  home-images                       Show home page images
  show <id>                         Show one photo
  gallery                           Show every category newest first

Categories: people, building, nature";

const GRID_COLUMNS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List { categories: Vec<Category> },
    Move { category: Category, id: PhotoId, index: usize },
    Delete { category: Category, ids: Vec<PhotoId>, all: bool },
    Register { category: Category, name: String, image_url: String },
    HomeImage { category: Category, image_url: String },
    HomeImages,
    Show { id: PhotoId },
    Gallery,
}

impl Command {
    /// Parse the subcommand and its arguments; global flags must already be taken
    pub fn parse(mut args: Arguments) -> Result<Self, String> {
        let name = args
            .subcommand()
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "missing command".to_string())?;

        let command = match name.as_str() {
            "list" => {
                let categories = rest(args)?
                    .iter()
                    .map(|arg| arg.parse::<Category>().map_err(|e| e.to_string()))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Command::List { categories });
            }
            "move" => Command::Move {
                category: free(&mut args, "category")?,
                id: PhotoId::from(free::<String>(&mut args, "photo id")?),
                index: free(&mut args, "index")?,
            },
            "delete" => {
                let all = args.contains("--all");
                let category = free(&mut args, "category")?;
                let ids: Vec<PhotoId> = rest(args)?.into_iter().map(PhotoId::from).collect();
                if all == !ids.is_empty() {
                    return Err("delete takes either --all or photo ids".to_string());
                }
                return Ok(Command::Delete { category, ids, all });
            }
            "register" => Command::Register {
                category: free(&mut args, "category")?,
                name: free(&mut args, "name")?,
                image_url: free(&mut args, "image url")?,
            },
            "home-image" => Command::HomeImage {
                category: free(&mut args, "category")?,
                image_url: free(&mut args, "image url")?,
            },
            "home-images" => Command::HomeImages,
            "show" => Command::Show {
                id: PhotoId::from(free::<String>(&mut args, "photo id")?),
            },
            "gallery" => Command::Gallery,
            other => return Err(format!("unknown command '{}'", other)),
        };

        let extra = rest(args)?;
        if let Some(arg) = extra.first() {
            return Err(format!("unexpected argument '{}'", arg));
        }
        Ok(command)
    }
}

fn free<T>(args: &mut Arguments, what: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    args.free_from_str().map_err(|e| format!("{}: {}", what, e))
}

/// Remaining positional arguments; a leftover flag is an error
fn rest(args: Arguments) -> Result<Vec<String>, String> {
    args.finish()
        .into_iter()
        .map(|arg| {
            let arg = arg
                .into_string()
                .map_err(|arg| format!("invalid argument {:?}", arg))?;
            if arg.starts_with('-') {
                return Err(format!("unknown option '{}'", arg));
            }
            Ok(arg)
        })
        .collect()
}

pub async fn run(
    command: Command,
    store: Arc<dyn PortfolioStore>,
    config: &AdminConfig,
    view_mode: ViewMode,
) -> Result<String, String> {
    let manager = CollectionManager::new(store.clone());

    match command {
        Command::List { categories } => {
            let categories = if categories.is_empty() { Category::ALL.to_vec() } else { categories };
            let mut state = view_state(categories[0], view_mode);
            let mut out = Vec::with_capacity(categories.len());
            for category in categories {
                state.switch_category(category);
                let photos = manager.load_partition(category).await.map_err(|e| e.to_string())?;
                out.push(render(&state, &photos));
            }
            Ok(out.join("\n"))
        }
        Command::Move { category, id, index } => {
            let mut state = view_state(category, view_mode);
            manager.load_partition(category).await.map_err(|e| e.to_string())?;

            state.begin_drag(id);
            let (id, index) = state.drop_at(index).ok_or("no photo is being dragged")?;
            match manager.move_photo(category, &id, index).await {
                Ok(photos) => Ok(render(&state, &photos)),
                Err(err) => Err(report_failure(&manager, &mut state, err)),
            }
        }
        Command::Delete { category, ids, all } => {
            let mut state = view_state(category, view_mode);
            let photos = manager.load_partition(category).await.map_err(|e| e.to_string())?;
            if all {
                state.select_all(&photos);
            }
            for id in &ids {
                if !state.is_selected(id) {
                    state.toggle_selected(id);
                }
            }
            if state.selected().is_empty() {
                return Ok(render(&state, &photos));
            }

            let selected = state.selected().clone();
            match manager.delete_photos(category, &selected).await {
                Ok(photos) => {
                    state.retain_visible(&photos);
                    Ok(render(&state, &photos))
                }
                Err(err) => Err(report_failure(&manager, &mut state, err)),
            }
        }
        Command::Register { category, name, image_url } => {
            let photo = NewPhoto::new(name, category, image_url, config.uploaded_by.as_str());
            let created = manager.register_photo(photo).await.map_err(|e| e.to_string())?;
            let state = view_state(category, view_mode);
            let photos = manager.load_partition(category).await.map_err(|e| e.to_string())?;
            Ok(format!("registered {} at position {}\n{}", created.id, created.position, render(&state, &photos)))
        }
        Command::HomeImage { category, image_url } => {
            if image_url.trim().is_empty() {
                return Err("image url is empty".to_string());
            }
            let image = HomeImage::new(category, image_url, config.uploaded_by.as_str());
            store.set_home_image(&image).await.map_err(|e| e.to_string())?;
            Ok(format!("home image for {} set to {}", category, image.image_url))
        }
        Command::HomeImages => {
            let images = store.home_images().await.map_err(|e| e.to_string())?;
            if images.is_empty() {
                return Ok("no home images".to_string());
            }
            let lines: Vec<String> = images
                .iter()
                .map(|image| format!("{:<9} {}  ({})", image.category, image.image_url, image.uploaded_by))
                .collect();
            Ok(lines.join("\n"))
        }
        Command::Show { id } => match manager.find_photo(&id).await.map_err(|e| e.to_string())? {
            Some(photo) => Ok(describe(&photo)),
            None => Err(format!("photo {} not found", id)),
        },
        Command::Gallery => {
            let grouped = photos_by_category(store.as_ref()).await.map_err(|e| e.to_string())?;
            let mut out = Vec::new();
            for (category, photos) in grouped {
                out.push(format!("{}:", category));
                if photos.is_empty() {
                    out.push("  (empty)".to_string());
                }
                out.extend(photos.iter().map(|photo| format!("  {}  {}", photo.name, photo.image_url)));
            }
            Ok(out.join("\n"))
        }
    }
}

fn view_state(category: Category, view_mode: ViewMode) -> AdminViewState {
    let mut state = AdminViewState::new(category);
    state.view_mode = view_mode;
    state
}

/// Show a failed commit with the order the store holds, or say the order
/// is unknown when the reload after it failed as well
fn report_failure(manager: &CollectionManager<dyn PortfolioStore>, state: &mut AdminViewState, err: CollectionError) -> String {
    let category = state.category();
    match (&err, manager.state(category), manager.view(category)) {
        (CollectionError::CommitFailed { .. }, Some(SyncState::Clean), Some(photos)) => {
            state.retain_visible(&photos);
            format!("{}
{}", err, render(state, &photos))
        }
        (CollectionError::CommitFailed { .. }, _, _) => {
            format!("{}
{} could not be reloaded; run `list {}` to see the stored order", err, category, category)
        }
        _ => err.to_string(),
    }
}

fn render(state: &AdminViewState, photos: &[Photo]) -> String {
    let mut out = format!("{} ({} photos)", state.category(), photos.len());
    let mark = |photo: &Photo| if state.is_selected(&photo.id) { "*" } else { "" };

    match state.view_mode {
        ViewMode::List => {
            for photo in photos {
                out.push_str(&format!(
                    "\n{:<1} {:>3}  {}  {}  {}",
                    mark(photo),
                    photo.position,
                    photo.id,
                    photo.name,
                    photo.image_url
                ));
            }
        }
        ViewMode::Grid => {
            for row in photos.chunks(GRID_COLUMNS) {
                let cells: Vec<String> = row.iter().map(|photo| format!("[{}{}]", photo.name, mark(photo))).collect();
                out.push('\n');
                out.push_str(&cells.join(" "));
            }
        }
    }
    out
}

fn describe(photo: &Photo) -> String {
    format!(
        "id:          {}\nname:        {}\ncategory:    {}\nposition:    {}\nimage:       {}\nuploaded by: {}\ncreated at:  {}",
        photo.id,
        photo.name,
        photo.category,
        photo.position,
        photo.image_url,
        photo.uploaded_by,
        chrono::DateTime::from_timestamp_millis(photo.created_at)
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| photo.created_at.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use folio_core::repository::{DocumentStore, SqliteStore};

    fn args(list: &[&str]) -> Arguments {
        Arguments::from_vec(list.iter().map(OsString::from).collect())
    }

    fn photo(id: &str, name: &str, position: u32) -> Photo {
        Photo {
            id: PhotoId::from(id),
            name: name.to_string(),
            category: Category::People,
            image_url: format!("https://img.example/{}.jpg", id),
            uploaded_by: "uid-1".to_string(),
            position,
            deleted: false,
            deleted_at: None,
            created_at: 1_700_000_000_000 + position as i64,
        }
    }

    async fn seeded() -> (Arc<SqliteStore>, Arc<dyn PortfolioStore>) {
        let sqlite = Arc::new(SqliteStore::open_in_memory().unwrap());
        for (i, (id, name)) in [("a", "Alpha"), ("b", "Bravo"), ("c", "Charlie"), ("d", "Delta")]
            .into_iter()
            .enumerate()
        {
            sqlite.import_photo(&photo(id, name, i as u32)).await.unwrap();
        }
        let store: Arc<dyn PortfolioStore> = sqlite.clone();
        (sqlite, store)
    }

    fn order_of(out: &str, names: &[&str]) -> Vec<usize> {
        names.iter().map(|name| out.find(name).unwrap()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse(args(&["move", "people", "abc", "2"])).unwrap(),
            Command::Move { category: Category::People, id: PhotoId::from("abc"), index: 2 }
        );
        assert_eq!(
            Command::parse(args(&["delete", "nature", "x", "y"])).unwrap(),
            Command::Delete {
                category: Category::Nature,
                ids: vec![PhotoId::from("x"), PhotoId::from("y")],
                all: false,
            }
        );
        assert_eq!(
            Command::parse(args(&["list"])).unwrap(),
            Command::List { categories: vec![] }
        );
        assert_eq!(Command::parse(args(&["gallery"])).unwrap(), Command::Gallery);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Command::parse(args(&[])).is_err());
        assert!(Command::parse(args(&["frobnicate"])).is_err());
        assert!(Command::parse(args(&["move", "people", "abc", "two"])).is_err());
        assert!(Command::parse(args(&["list", "animals"])).is_err());
        assert!(Command::parse(args(&["show", "a", "b"])).is_err());
        assert!(Command::parse(args(&["delete", "people"])).is_err());
        assert!(Command::parse(args(&["delete", "people", "--all", "a"])).is_err());
    }

    #[tokio::test]
    async fn test_move_prints_new_order_and_persists_it() {
        let (sqlite, store) = seeded().await;
        let command = Command::Move { category: Category::People, id: PhotoId::from("d"), index: 0 };

        let out = run(command, store, &AdminConfig::default(), ViewMode::List).await.unwrap();
        let at = order_of(&out, &["Delta", "Alpha", "Bravo", "Charlie"]);
        assert!(at.windows(2).all(|w| w[0] < w[1]), "unexpected order:\n{}", out);

        let stored = sqlite
            .query(Category::People, Default::default(), Default::default())
            .await
            .unwrap();
        let ids: Vec<&str> = stored.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_move_unknown_photo_fails() {
        let (_, store) = seeded().await;
        let command = Command::Move { category: Category::People, id: PhotoId::from("zz"), index: 0 };
        let err = run(command, store, &AdminConfig::default(), ViewMode::Grid).await.unwrap_err();
        assert!(err.contains("zz"));
    }

    #[tokio::test]
    async fn test_delete_hides_photos() {
        let (sqlite, store) = seeded().await;
        let command = Command::Delete { category: Category::People, ids: vec![PhotoId::from("b")], all: false };

        let out = run(command, store.clone(), &AdminConfig::default(), ViewMode::Grid).await.unwrap();
        assert!(out.starts_with("people (3 photos)"));
        assert!(!out.contains("Bravo"));
        assert!(!out.contains('*'));

        let deleted = sqlite.find(&PhotoId::from("b")).await.unwrap().unwrap();
        assert!(deleted.deleted);

        let err = run(Command::Show { id: PhotoId::from("b") }, store, &AdminConfig::default(), ViewMode::Grid)
            .await
            .unwrap_err();
        assert!(err.contains("not found"));
    }

    #[tokio::test]
    async fn test_delete_all_empties_category() {
        let (_, store) = seeded().await;
        let command = Command::Delete { category: Category::People, ids: vec![], all: true };
        let out = run(command, store, &AdminConfig::default(), ViewMode::Grid).await.unwrap();
        assert_eq!(out, "people (0 photos)");
    }

    #[tokio::test]
    async fn test_register_appends_after_existing() {
        let (_, store) = seeded().await;
        let config = AdminConfig { uploaded_by: "uid-9".to_string(), ..AdminConfig::default() };
        let command = Command::Register {
            category: Category::People,
            name: "Echo".to_string(),
            image_url: "https://img.example/e.jpg".to_string(),
        };

        let out = run(command, store, &config, ViewMode::Grid).await.unwrap();
        assert!(out.contains("at position 4"));
        assert!(out.contains("[Alpha] [Bravo] [Charlie] [Delta]\n[Echo]"));
    }

    #[tokio::test]
    async fn test_home_images_overwrite_per_category() {
        let (_, store) = seeded().await;
        let config = AdminConfig::default();
        for url in ["https://img.example/old.jpg", "https://img.example/new.jpg"] {
            let command = Command::HomeImage { category: Category::Nature, image_url: url.to_string() };
            run(command, store.clone(), &config, ViewMode::Grid).await.unwrap();
        }

        let out = run(Command::HomeImages, store, &config, ViewMode::Grid).await.unwrap();
        assert!(out.contains("https://img.example/new.jpg"));
        assert!(!out.contains("old.jpg"));
    }

    #[tokio::test]
    async fn test_gallery_lists_newest_first() {
        let (_, store) = seeded().await;
        let out = run(Command::Gallery, store, &AdminConfig::default(), ViewMode::Grid).await.unwrap();
        let at = order_of(&out, &["Delta", "Charlie", "Bravo", "Alpha"]);
        assert!(at.windows(2).all(|w| w[0] < w[1]), "unexpected order:\n{}", out);
        assert!(out.contains("building:\n  (empty)"));
    }
}
