//! Integration tests for path and entity resolution.
//!
//! Tests cover:
//! - Repeated path resolution served from caches and reverse indices
//! - Files shared between series (folder ownership, ambiguity)
//! - Bulk clearing, manual and on stall
//! - Virtual file names and media root discovery
//! - Several files or locations matching one path
//! - Episode grouping inside a file (specials, parts)
//! - External-structure series, movies and collections
//! - Show lookup by key

mod support;

use anime_resolver::core::index::PathTarget;
use anime_resolver::core::usage::UsageTracker;
use anime_resolver::models::catalog::{
    EpisodeType, FileLocation, Percentage, TmdbEpisode, TmdbMovieCollection, TmdbSeason, TmdbShow,
};
use anime_resolver::models::config::{Config, StructureType};
use anime_resolver::models::ids::Identifier;
use anime_resolver::models::info::{EpisodeKind, ExternalLink, ShowKey};
use anime_resolver::services::library::StaticLibraryIndex;
use anime_resolver::utils::paths;
use anime_resolver::Error;
use std::sync::Arc;
use std::time::Duration;
use support::{
    date, library_path, resolver_with, resolver_with_library, test_config, MockCatalog,
    LIBRARY_ROOT,
};

// ========== TEST FIXTURES ==========

/// Two series in their own groups, each with its own folder.
fn two_show_catalog() -> MockCatalog {
    let mut catalog = MockCatalog::new();
    catalog.add_group(1, 10, "Alpha");
    catalog.add_group(2, 20, "Beta");
    catalog.add_series(10, 1, "Alpha", date(2020, 1, 1));
    catalog.add_series(20, 2, "Beta", date(2021, 1, 1));
    catalog.add_episode(100, 10, 1, EpisodeType::Normal);
    catalog.add_episode(101, 10, 2, EpisodeType::Normal);
    catalog.add_episode(200, 20, 1, EpisodeType::Normal);
    catalog.add_file(1000, "Alpha/Alpha - 01.mkv", &[(10, &[100])]);
    catalog.add_file(1001, "Alpha/Alpha - 02.mkv", &[(10, &[101])]);
    catalog.add_file(3000, "Beta/Beta - 01.mkv", &[(20, &[200])]);
    catalog
}

// ========== PATH RESOLUTION ==========

#[tokio::test]
async fn test_resolve_path_builds_file_season_and_show() {
    let catalog = Arc::new(two_show_catalog());
    let resolver = resolver_with(catalog.clone(), test_config());

    let path = library_path("Alpha/Alpha - 01.mkv");
    let resolved = resolver.resolve_by_path(&path).await.unwrap().unwrap();

    assert_eq!(resolved.file.id, 1000);
    assert_eq!(resolved.file.series_id, 10);
    assert_eq!(resolved.file.episode_ids(), vec![Identifier::native(100)]);

    let season = resolved.season.unwrap();
    assert_eq!(season.id, Identifier::native(10));
    assert_eq!(season.episodes.len(), 2);
    assert_eq!(season.episodes[0].season_number, 1);

    let show = resolved.show.unwrap();
    assert_eq!(show.key, ShowKey::Group(1));
    assert_eq!(show.default_season_id, Identifier::native(10));
    assert_eq!(show.title, "Alpha");
}

#[tokio::test]
async fn test_repeated_resolution_is_identical_and_local() {
    let catalog = Arc::new(two_show_catalog());
    let resolver = resolver_with(catalog.clone(), test_config());
    let path = library_path("Alpha/Alpha - 01.mkv");

    let first = resolver.resolve_by_path(&path).await.unwrap().unwrap();
    let calls = catalog.total_calls();
    let second = resolver.resolve_by_path(&path).await.unwrap().unwrap();

    assert_eq!(catalog.total_calls(), calls);
    assert!(Arc::ptr_eq(&first.file, &second.file));
    assert_eq!(first.season.unwrap().id, second.season.unwrap().id);
    assert_eq!(first.show.unwrap().key, second.show.unwrap().key);
}

#[tokio::test]
async fn test_reverse_indices_filled_after_resolution() {
    let catalog = Arc::new(two_show_catalog());
    let resolver = resolver_with(catalog, test_config());
    let path = library_path("Alpha/Alpha - 01.mkv");

    assert!(resolver.try_get_file_ids_for_path(&path).is_none());
    resolver.resolve_by_path(&path).await.unwrap();

    assert_eq!(
        resolver.try_get_file_ids_for_path(&path),
        Some(PathTarget {
            file_id: 1000,
            series_id: 10
        })
    );
    assert_eq!(
        resolver.try_get_episode_ids_for_path(&path),
        Some(vec![Identifier::native(100)])
    );
    assert_eq!(
        resolver.try_get_season_id_for_episode(&Identifier::native(101)),
        Some(Identifier::native(10))
    );
    assert_eq!(
        resolver.try_get_show_key_for_season(&Identifier::native(10)),
        Some(ShowKey::Group(1))
    );
}

#[tokio::test]
async fn test_unknown_file_is_none() {
    let catalog = Arc::new(two_show_catalog());
    let resolver = resolver_with(catalog, test_config());

    let resolved = resolver
        .resolve_by_path(&library_path("Gamma/Gamma - 01.mkv"))
        .await
        .unwrap();
    assert!(resolved.is_none());
}

#[tokio::test]
async fn test_media_root_discovered_from_library() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let root = temp_dir.path().to_string_lossy().to_string();
    std::fs::create_dir_all(temp_dir.path().join("Alpha")).unwrap();
    std::fs::write(temp_dir.path().join("Alpha").join("Alpha - 02.mkv"), b"x").unwrap();

    let catalog = Arc::new(two_show_catalog());
    let mut config = test_config();
    config.library.folders = Vec::new();
    let library = StaticLibraryIndex::new([root.as_str()]);
    let resolver = resolver_with_library(catalog.clone(), config, library);
    assert!(resolver.index().media_roots().is_empty());

    let resolved = resolver
        .resolve_by_path(&format!("{}/Alpha/Alpha - 02.mkv", root))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.file.id, 1001);
    assert_eq!(resolver.index().media_roots(), vec![paths::normalize(&root)]);
    assert_eq!(catalog.calls("get_files_by_path"), 1);
}

#[tokio::test]
async fn test_path_unknown_to_host_is_not_searched() {
    let catalog = Arc::new(two_show_catalog());
    let resolver = resolver_with(catalog.clone(), test_config());

    let resolved = resolver
        .resolve_by_path("/elsewhere/Beta/Beta - 01.mkv")
        .await
        .unwrap();
    assert!(resolved.is_none());
    assert_eq!(catalog.calls("get_files_by_path"), 0);
    assert_eq!(resolver.index().media_roots(), vec![LIBRARY_ROOT.to_string()]);
}

#[tokio::test]
async fn test_virtual_path_skips_path_search() {
    let catalog = Arc::new(two_show_catalog());
    let mut config = test_config();
    config.library.virtual_root = Some("/virtual".to_string());
    let resolver = resolver_with(catalog.clone(), config);

    let path = "/virtual/Alpha/Season 01/Alpha S01E02 [shoko-series-10] [shoko-file-1001].mkv";
    let resolved = resolver.resolve_by_path(path).await.unwrap().unwrap();

    assert_eq!(resolved.file.id, 1001);
    assert_eq!(resolved.file.episode_ids(), vec![Identifier::native(101)]);
    assert_eq!(catalog.calls("get_files_by_path"), 0);
    assert!(resolver.try_get_file_ids_for_path(path).is_some());
}

// ========== SHARED FILES ==========

#[tokio::test]
async fn test_shared_file_resolves_through_folder_owner() {
    let mut catalog = two_show_catalog();
    catalog.add_episode(201, 20, 2, EpisodeType::Normal);
    catalog.add_file(4000, "Beta/Beta - 02.mkv", &[(10, &[101]), (20, &[201])]);
    let resolver = resolver_with(Arc::new(catalog), test_config());

    let resolved = resolver
        .resolve_by_path(&library_path("Beta/Beta - 02.mkv"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.file.series_id, 20);
    assert_eq!(resolved.file.episode_ids(), vec![Identifier::native(201)]);
    assert_eq!(resolved.season.unwrap().id, Identifier::native(20));
}

#[tokio::test]
async fn test_shared_file_in_mixed_folder_is_ambiguous() {
    let mut catalog = two_show_catalog();
    catalog.add_file(5000, "Mixed/Crossover.mkv", &[(10, &[100]), (20, &[200])]);
    let resolver = resolver_with(Arc::new(catalog), test_config());

    let err = resolver
        .resolve_by_path(&library_path("Mixed/Crossover.mkv"))
        .await
        .unwrap_err();

    assert!(err.is_integrity());
    match err.root() {
        Error::AmbiguousFolder {
            file_id,
            candidates,
            ..
        } => {
            assert_eq!(*file_id, 5000);
            assert_eq!(candidates, &vec![10, 20]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_first_of_several_matching_files_is_used() {
    let mut catalog = two_show_catalog();
    catalog.add_file(1500, "Old/Alpha/Alpha - 01.mkv", &[(10, &[101])]);
    let catalog = Arc::new(catalog);
    let resolver = resolver_with(catalog.clone(), test_config());

    let resolved = resolver
        .resolve_by_path(&library_path("Alpha/Alpha - 01.mkv"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.file.id, 1000);
    assert_eq!(resolved.file.episode_ids(), vec![Identifier::native(100)]);
}

#[tokio::test]
async fn test_first_of_several_matching_locations_picks_the_folder() {
    let mut catalog = two_show_catalog();
    catalog.add_episode(201, 20, 2, EpisodeType::Normal);
    catalog
        .add_file(6000, "Beta/Shared.mkv", &[(10, &[101]), (20, &[201])])
        .locations
        .push(FileLocation {
            import_folder_id: 2,
            relative_path: "Backup/Beta/Shared.mkv".to_string(),
        });
    catalog
        .add_file(6001, "Backup/Beta/Other.mkv", &[(10, &[100]), (20, &[200])])
        .locations
        .push(FileLocation {
            import_folder_id: 1,
            relative_path: "Beta/Other.mkv".to_string(),
        });
    let resolver = resolver_with(Arc::new(catalog), test_config());

    let resolved = resolver
        .resolve_by_path(&library_path("Beta/Shared.mkv"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.file.series_id, 20);

    // The backup folder comes first here and belongs to nobody.
    let err = resolver
        .resolve_by_path(&library_path("Beta/Other.mkv"))
        .await
        .unwrap_err();
    assert!(matches!(err.root(), Error::AmbiguousFolder { file_id: 6001, .. }));
}

#[tokio::test]
async fn test_file_without_locations_is_integrity_error() {
    let mut catalog = two_show_catalog();
    catalog.add_file(6000, "Ghost/ghost.mkv", &[(10, &[100])]).locations.clear();
    catalog
        .path_overrides
        .insert("/Ghost/ghost.mkv".to_string(), vec![6000]);
    let resolver = resolver_with(Arc::new(catalog), test_config());

    let err = resolver
        .resolve_by_path(&library_path("Ghost/ghost.mkv"))
        .await
        .unwrap_err();
    assert!(matches!(err.root(), Error::MissingFileLocation { file_id: 6000 }));
}

// ========== CLEARING ==========

#[tokio::test]
async fn test_clear_forces_remote_lookups() {
    let catalog = Arc::new(two_show_catalog());
    let resolver = resolver_with(catalog.clone(), test_config());
    let path = library_path("Alpha/Alpha - 01.mkv");

    resolver.resolve_by_path(&path).await.unwrap();
    let series_calls = catalog.calls("get_series");

    resolver.clear();
    assert!(resolver.try_get_file_ids_for_path(&path).is_none());
    assert!(resolver
        .try_get_season_id_for_episode(&Identifier::native(100))
        .is_none());
    // Media roots survive.
    assert_eq!(resolver.index().media_roots(), vec!["/mnt/anime".to_string()]);

    let resolved = resolver.resolve_by_path(&path).await.unwrap().unwrap();
    assert_eq!(resolved.file.id, 1000);
    assert!(catalog.calls("get_series") > series_calls);
}

#[tokio::test]
async fn test_stall_clears_caches() {
    let catalog = Arc::new(two_show_catalog());
    let resolver = resolver_with(catalog, test_config());
    let tracker = UsageTracker::new(Duration::from_millis(20));
    let watcher = resolver.watch_stalls(tracker.clone());
    let path = library_path("Alpha/Alpha - 01.mkv");

    resolver.resolve_by_path(&path).await.unwrap();
    assert!(resolver.try_get_file_ids_for_path(&path).is_some());

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(tracker.check());

    let mut cleared = false;
    for _ in 0..100 {
        if resolver.try_get_file_ids_for_path(&path).is_none() {
            cleared = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(cleared);
    watcher.abort();
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let catalog = Arc::new(two_show_catalog());
    let resolver = resolver_with(catalog.clone(), test_config());
    let path = library_path("Alpha/Alpha - 01.mkv");

    catalog.fail("get_series", 1);
    let err = resolver.resolve_by_path(&path).await.unwrap_err();
    assert!(matches!(err.root(), Error::Server { status: 503, .. }));
    assert!(!err.is_integrity());

    let resolved = resolver.resolve_by_path(&path).await.unwrap().unwrap();
    assert_eq!(resolved.file.id, 1000);
}

#[tokio::test]
async fn test_concurrent_season_lookups_share_one_build() {
    let catalog = Arc::new(two_show_catalog());
    let resolver = resolver_with(catalog.clone(), test_config());

    let lookups: Vec<_> = (0..8)
        .map(|_| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.get_season(&Identifier::native(10)).await })
        })
        .collect();
    let seasons: Vec<_> = futures::future::join_all(lookups)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().unwrap())
        .collect();

    assert!(seasons.iter().all(|s| Arc::ptr_eq(s, &seasons[0])));
    assert_eq!(catalog.calls("get_episodes_in_series"), 1);
}

// ========== EPISODES ==========

#[tokio::test]
async fn test_hidden_and_unknown_episodes_are_skipped() {
    let mut catalog = two_show_catalog();
    catalog.add_episode(102, 10, 3, EpisodeType::Normal).is_hidden = true;
    catalog.add_file(1002, "Alpha/Alpha - 02-03.mkv", &[(10, &[101, 102, 999])]);
    let resolver = resolver_with(Arc::new(catalog), test_config());

    let resolved = resolver
        .resolve_by_path(&library_path("Alpha/Alpha - 02-03.mkv"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.file.episode_ids(), vec![Identifier::native(101)]);

    let season = resolved.season.unwrap();
    assert!(season.find_episode(&Identifier::native(102)).is_none());
}

#[tokio::test]
async fn test_file_groups_special_episodes_first() {
    let mut catalog = two_show_catalog();
    catalog.add_episode(150, 10, 1, EpisodeType::Special);
    catalog.add_file(1003, "Alpha/Alpha - 02 + SP1.mkv", &[(10, &[101, 150])]);
    let resolver = resolver_with(Arc::new(catalog), test_config());

    let file = resolver.get_file(1003, 10).await.unwrap().unwrap();
    assert_eq!(file.episode_ids(), vec![Identifier::native(150)]);
    assert_eq!(file.episodes[0].kind, EpisodeKind::Special);
    assert_eq!(file.episodes[0].season_number, 0);
    assert_eq!(file.alternate_groups.len(), 1);
    assert_eq!(file.alternate_groups[0][0].id, Identifier::native(101));
}

#[tokio::test]
async fn test_file_groups_parts_with_standalone_first() {
    let mut catalog = two_show_catalog();
    catalog.add_episode(102, 10, 3, EpisodeType::Normal);
    catalog.add_file(1100, "Alpha/Alpha - Parts.mkv", &[(10, &[100, 101, 102])]);
    catalog.set_percentage(1100, 100, Percentage { start: 0, end: 100, group: 2 });
    catalog.set_percentage(1100, 101, Percentage { start: 0, end: 50, group: 1 });
    catalog.set_percentage(1100, 102, Percentage { start: 0, end: 100, group: 1 });
    let resolver = resolver_with(Arc::new(catalog), test_config());

    let file = resolver.get_file(1100, 10).await.unwrap().unwrap();
    assert_eq!(file.episode_ids(), vec![Identifier::native(102)]);
    let alternates: Vec<Vec<Identifier>> = file
        .alternate_groups
        .iter()
        .map(|group| group.iter().map(|e| e.id).collect())
        .collect();
    assert_eq!(
        alternates,
        vec![vec![Identifier::native(101)], vec![Identifier::native(100)]]
    );
}

#[tokio::test]
async fn test_season_by_episode_id() {
    let catalog = Arc::new(two_show_catalog());
    let resolver = resolver_with(catalog, test_config());

    let season = resolver
        .get_season_by_episode_id(&Identifier::native(200))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(season.id, Identifier::native(20));

    let episode = resolver.get_episode(&Identifier::native(200)).await.unwrap().unwrap();
    assert_eq!(episode.season_id, Identifier::native(20));
    assert!(resolver.get_episode(&Identifier::native(404)).await.unwrap().is_none());
}

// ========== EXTERNAL STRUCTURE ==========

fn external_catalog() -> MockCatalog {
    let mut catalog = two_show_catalog();
    catalog.series.get_mut(&10).unwrap().tmdb_show_ids = vec![5];
    catalog.episodes.get_mut(&100).unwrap().tmdb_episode_ids = vec![500];
    catalog.tmdb_shows.insert(
        5,
        TmdbShow {
            id: 5,
            title: "Alpha (TV)".to_string(),
            overview: None,
            first_aired_at: date(2020, 1, 1),
        },
    );
    catalog.tmdb_seasons.insert(
        50,
        TmdbSeason {
            id: 50,
            show_id: 5,
            season_number: 1,
            title: "Season 1".to_string(),
            overview: None,
        },
    );
    catalog.tmdb_episodes.insert(
        500,
        TmdbEpisode {
            id: 500,
            show_id: 5,
            season_id: 50,
            season_number: 1,
            episode_number: 1,
            title: "Pilot".to_string(),
            overview: None,
            aired_at: date(2020, 1, 1),
        },
    );
    catalog
}

#[tokio::test]
async fn test_external_structure_translates_episodes() {
    let catalog = Arc::new(external_catalog());
    let mut config = test_config();
    config
        .library
        .structure_overrides
        .insert("10".to_string(), StructureType::Tmdb);
    let resolver = resolver_with(catalog, config);

    let resolved = resolver
        .resolve_by_path(&library_path("Alpha/Alpha - 01.mkv"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(resolved.file.episode_ids(), vec![Identifier::tmdb_show(500)]);
    let season = resolved.season.unwrap();
    assert_eq!(season.id, Identifier::tmdb_show(50));
    let show = resolved.show.unwrap();
    assert_eq!(show.key, ShowKey::TmdbShow(5));
    assert_eq!(show.external, Some(ExternalLink::Show(5)));
}

fn tmdb_config() -> Config {
    let mut config = test_config();
    config
        .library
        .structure_overrides
        .insert("10".to_string(), StructureType::Tmdb);
    config
}

fn tmdb_episode(id: u32, episode_number: u32) -> TmdbEpisode {
    TmdbEpisode {
        id,
        show_id: 5,
        season_id: 50,
        season_number: 1,
        episode_number,
        title: format!("Episode {}", episode_number),
        overview: None,
        aired_at: None,
    }
}

#[tokio::test]
async fn test_external_structure_drops_unmatched_episodes() {
    let catalog = Arc::new(external_catalog());
    let resolver = resolver_with(catalog, tmdb_config());

    let resolved = resolver
        .resolve_by_path(&library_path("Alpha/Alpha - 02.mkv"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.file.id, 1001);
    assert!(resolved.file.episodes.is_empty());
    assert!(resolved.file.alternate_groups.is_empty());
    assert!(resolved.season.is_none());
    assert!(resolved.show.is_none());
}

#[tokio::test]
async fn test_external_structure_fans_out_and_deduplicates() {
    let mut catalog = external_catalog();
    catalog.tmdb_episodes.insert(501, tmdb_episode(501, 2));
    catalog.episodes.get_mut(&100).unwrap().tmdb_episode_ids = vec![501, 500];
    catalog.episodes.get_mut(&101).unwrap().tmdb_episode_ids = vec![501];
    catalog.add_file(1200, "Alpha/Alpha - 01-02.mkv", &[(10, &[100, 101])]);
    let resolver = resolver_with(Arc::new(catalog), tmdb_config());

    let file = resolver.get_file(1200, 10).await.unwrap().unwrap();
    assert_eq!(
        file.episode_ids(),
        vec![Identifier::tmdb_show(500), Identifier::tmdb_show(501)]
    );
    assert!(file.alternate_groups.is_empty());
}

#[tokio::test]
async fn test_group_show_picks_most_referenced_external_show() {
    let catalog = Arc::new(external_catalog());
    let resolver = resolver_with(catalog, test_config());

    let show = resolver.get_group(1).await.unwrap().unwrap();
    assert_eq!(show.external, Some(ExternalLink::Show(5)));
    assert_eq!(show.season_ids(), vec![Identifier::native(10)]);
}

#[tokio::test]
async fn test_group_show_seasons_vote_for_external_show() {
    let mut catalog = external_catalog();
    catalog.add_series(11, 1, "Alpha 2nd Season", date(2021, 1, 1)).tmdb_show_ids = vec![5];
    catalog.add_series(12, 1, "Alpha Gaiden", date(2022, 1, 1)).tmdb_show_ids = vec![6];
    let resolver = resolver_with(Arc::new(catalog), test_config());

    let show = resolver.get_group(1).await.unwrap().unwrap();
    assert_eq!(show.external, Some(ExternalLink::Show(5)));
    assert_eq!(
        show.season_ids(),
        vec![Identifier::native(10), Identifier::native(11), Identifier::native(12)]
    );
}

#[tokio::test]
async fn test_group_show_collection_outvotes_show() {
    let mut catalog = external_catalog();
    catalog.add_series(11, 1, "Alpha Movie", date(2021, 1, 1)).tmdb_movie_ids = vec![70];
    catalog.add_series(12, 1, "Alpha Movie 2", date(2022, 1, 1)).tmdb_movie_ids = vec![71];
    catalog.add_tmdb_movie(70, Some(3), "Alpha Movie", date(2021, 1, 1));
    catalog.add_tmdb_movie(71, Some(3), "Alpha Movie 2", date(2022, 1, 1));
    let resolver = resolver_with(Arc::new(catalog), test_config());

    let show = resolver.get_group(1).await.unwrap().unwrap();
    assert_eq!(show.external, Some(ExternalLink::Collection(3)));
}

/// Two movies of one collection, listed out of release order.
fn saga_catalog() -> MockCatalog {
    let mut catalog = MockCatalog::new();
    catalog.add_tmdb_movie(7, Some(3), "Part One", date(2019, 6, 1));
    catalog.add_tmdb_movie(8, Some(3), "Part Two", date(2021, 6, 1));
    catalog.tmdb_collections.insert(
        3,
        TmdbMovieCollection {
            id: 3,
            title: "The Saga".to_string(),
            overview: None,
            movie_ids: vec![8, 7],
        },
    );
    catalog
}

#[tokio::test]
async fn test_movie_collection_as_show() {
    let resolver = resolver_with(Arc::new(saga_catalog()), test_config());

    let show = resolver
        .get_show_by_season_id(&Identifier::tmdb_movie(8))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(show.key, ShowKey::TmdbCollection(3));
    assert_eq!(
        show.season_ids(),
        vec![Identifier::tmdb_movie(7), Identifier::tmdb_movie(8)]
    );
    assert_eq!(show.default_season_id, Identifier::tmdb_movie(7));

    // A collection id names a show, never a season.
    assert!(resolver
        .get_season(&Identifier::tmdb_collection(3))
        .await
        .unwrap()
        .is_none());
}

// ========== SHOW KEYS ==========

#[tokio::test]
async fn test_standalone_key_resolves_to_owning_show() {
    let resolver = resolver_with(Arc::new(saga_catalog()), test_config());

    let show = resolver
        .get_show(ShowKey::Standalone(Identifier::tmdb_movie(7)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(show.key, ShowKey::TmdbCollection(3));
    assert_eq!(
        resolver.try_get_show_key_for_season(&Identifier::tmdb_movie(7)),
        Some(ShowKey::TmdbCollection(3))
    );

    let again = resolver.get_collection(3).await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&show, &again));
    assert!(resolver
        .get_show(ShowKey::Standalone(Identifier::tmdb_movie(404)))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_collection_key_ignored_when_movies_stand_alone() {
    let mut config = test_config();
    config.library.collections_as_shows = false;
    let resolver = resolver_with(Arc::new(saga_catalog()), config);

    assert!(resolver.get_collection(3).await.unwrap().is_none());

    let show = resolver
        .get_show_by_season_id(&Identifier::tmdb_movie(7))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(show.key, ShowKey::Standalone(Identifier::tmdb_movie(7)));
    assert_eq!(show.season_ids(), vec![Identifier::tmdb_movie(7)]);
    assert_eq!(
        resolver.try_get_show_key_for_season(&Identifier::tmdb_movie(7)),
        Some(show.key)
    );
}
