use officials_core::db::{open_db_in_memory, DbError};
use officials_core::service::official_service::{MESSAGE_CREATED, MESSAGE_DELETED, MESSAGE_UPDATED};
use officials_core::{
    ActionKind, ImageStore, NewOfficial, Official, OfficialForm, OfficialId, OfficialListQuery,
    OfficialRepository, OfficialService, OfficialServiceError, Position, RepoError, RepoResult,
    SqliteOfficialRepository, UploadedImage,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

struct Fixture {
    conn: Connection,
    uploads: TempDir,
    incoming: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            conn: open_db_in_memory().unwrap(),
            uploads: tempfile::tempdir().unwrap(),
            incoming: tempfile::tempdir().unwrap(),
        }
    }

    fn upload_dir(&self) -> PathBuf {
        self.uploads.path().join("provincial_officials")
    }

    fn service(&self) -> OfficialService<SqliteOfficialRepository<'_>> {
        OfficialService::new(
            SqliteOfficialRepository::new(&self.conn),
            ImageStore::new(self.upload_dir()),
        )
    }

    fn upload(&self, original_name: &str, bytes: &[u8]) -> UploadedImage {
        let path = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(self.incoming.path())
            .unwrap()
            .into_temp_path()
            .keep()
            .unwrap();
        std::fs::write(&path, bytes).unwrap();
        UploadedImage::new(path, original_name)
    }

    fn stored_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.upload_dir()) else {
            return Vec::new();
        };
        let mut names = entries
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        names.sort();
        names
    }
}

/// Delegates reads to SQLite but fails every create/update.
struct FailingWrites<'conn> {
    inner: SqliteOfficialRepository<'conn>,
}

fn write_failure() -> RepoError {
    RepoError::Db(DbError::Sqlite(rusqlite::Error::InvalidQuery))
}

impl OfficialRepository for FailingWrites<'_> {
    fn create_official(&self, _official: &NewOfficial) -> RepoResult<OfficialId> {
        Err(write_failure())
    }

    fn update_official(&self, _official: &Official) -> RepoResult<()> {
        Err(write_failure())
    }

    fn get_official(&self, id: OfficialId) -> RepoResult<Option<Official>> {
        self.inner.get_official(id)
    }

    fn list_officials(&self, query: &OfficialListQuery) -> RepoResult<Vec<Official>> {
        self.inner.list_officials(query)
    }

    fn delete_official(&self, id: OfficialId) -> RepoResult<()> {
        self.inner.delete_official(id)
    }
}

fn form(name: &str, position: &str) -> OfficialForm {
    OfficialForm {
        name: Some(name.to_string()),
        position: Some(position.to_string()),
        ..OfficialForm::default()
    }
}

fn form_with_image(name: &str, position: &str, upload: UploadedImage) -> OfficialForm {
    OfficialForm {
        profile_image: Some(upload),
        ..form(name, position)
    }
}

fn file_exists(dir: &Path, name: &str) -> bool {
    dir.join(name).is_file()
}

#[test]
fn store_without_image_leaves_profile_image_null() {
    let fixture = Fixture::new();
    let service = fixture.service();

    let outcome = service.store(form("Juan", "Governor")).unwrap();
    assert_eq!(outcome.kind, ActionKind::Created);
    assert_eq!(outcome.message, MESSAGE_CREATED);

    let official = service.find(outcome.official_id).unwrap();
    assert_eq!(official.name, "Juan");
    assert_eq!(official.position, "Governor");
    assert!(official.profile_image.is_none());
    assert!(fixture.upload_dir().is_dir());
}

#[test]
fn store_with_image_moves_upload_under_random_name() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let upload = fixture.upload("portrait.PNG", PNG_BYTES);
    let incoming_path = upload.path.clone();

    let outcome = service
        .store(form_with_image("Juan", "Governor", upload))
        .unwrap();

    let official = service.find(outcome.official_id).unwrap();
    let stored = official.profile_image.unwrap();
    assert_eq!(stored.len(), 20 + ".png".len());
    assert!(stored.ends_with(".png"));
    assert!(file_exists(&fixture.upload_dir(), &stored));
    assert!(!incoming_path.exists());
    assert_eq!(
        std::fs::read(fixture.upload_dir().join(&stored)).unwrap(),
        PNG_BYTES
    );
}

#[test]
fn store_without_position_fails_and_persists_nothing() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let upload = fixture.upload("portrait.png", PNG_BYTES);
    let incoming_path = upload.path.clone();

    let input = OfficialForm {
        name: Some("Juan".to_string()),
        position: None,
        profile_image: Some(upload),
        remove_image: false,
    };
    let err = service.store(input).unwrap_err();

    match err {
        OfficialServiceError::Validation(errors) => assert!(errors.has("position")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(service
        .list(&OfficialListQuery::default())
        .unwrap()
        .officials
        .is_empty());
    assert!(incoming_path.exists());
    assert!(fixture.stored_files().is_empty());
}

#[test]
fn store_rejects_bmp_upload() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let upload = fixture.upload("portrait.bmp", b"BM\x36\x00\x00\x00\x00\x00");

    let err = service
        .store(form_with_image("Juan", "Governor", upload))
        .unwrap_err();

    match err {
        OfficialServiceError::Validation(errors) => {
            assert!(errors.has("profile_image"));
            assert!(!errors.has("name"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn store_rejects_image_with_disallowed_extension() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let upload = fixture.upload("portrait.webp", PNG_BYTES);

    let err = service
        .store(form_with_image("Juan", "Governor", upload))
        .unwrap_err();
    assert!(matches!(err, OfficialServiceError::Validation(errors) if errors.has("profile_image")));
}

#[test]
fn store_rejects_image_over_size_limit() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let mut bytes = PNG_BYTES.to_vec();
    bytes.resize(5120 * 1024 + 1, 0);
    let upload = fixture.upload("portrait.png", &bytes);

    let err = service
        .store(form_with_image("Juan", "Governor", upload))
        .unwrap_err();
    match err {
        OfficialServiceError::Validation(errors) => assert_eq!(
            errors.messages("profile_image"),
            ["The profile image field must not be greater than 5120 kilobytes."]
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn update_with_new_image_replaces_previous_file() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let created = service
        .store(form_with_image(
            "Juan",
            "Governor",
            fixture.upload("old.png", PNG_BYTES),
        ))
        .unwrap();
    let old_image = service
        .find(created.official_id)
        .unwrap()
        .profile_image
        .unwrap();

    let outcome = service
        .update(
            created.official_id,
            form_with_image(
                "Juan Dela Cruz",
                "Vice Governor",
                fixture.upload("new.jpg", JPEG_BYTES),
            ),
        )
        .unwrap();
    assert_eq!(outcome.kind, ActionKind::Updated);
    assert_eq!(outcome.message, MESSAGE_UPDATED);

    let official = service.find(created.official_id).unwrap();
    let new_image = official.profile_image.unwrap();
    assert_ne!(new_image, old_image);
    assert!(new_image.ends_with(".jpg"));
    assert!(!file_exists(&fixture.upload_dir(), &old_image));
    assert!(file_exists(&fixture.upload_dir(), &new_image));
    assert_eq!(official.name, "Juan Dela Cruz");
    assert_eq!(official.position, "Vice Governor");
    assert_eq!(fixture.stored_files(), [new_image]);
}

#[test]
fn update_with_new_image_wins_over_remove_flag() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let created = service.store(form("Juan", "Governor")).unwrap();

    let mut input = form_with_image("Juan", "Governor", fixture.upload("a.gif", b"GIF89a\x01\x00"));
    input.remove_image = true;
    service.update(created.official_id, input).unwrap();

    let official = service.find(created.official_id).unwrap();
    assert!(official.profile_image.is_some());
}

#[test]
fn update_with_remove_flag_clears_image_and_file() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let created = service
        .store(form_with_image(
            "Maria",
            "Liga ng mga Barangay",
            fixture.upload("portrait.png", PNG_BYTES),
        ))
        .unwrap();
    let old_image = service
        .find(created.official_id)
        .unwrap()
        .profile_image
        .unwrap();

    let mut input = form("Maria", "Liga ng mga Barangay");
    input.remove_image = true;
    service.update(created.official_id, input).unwrap();

    let official = service.find(created.official_id).unwrap();
    assert!(official.profile_image.is_none());
    assert!(!file_exists(&fixture.upload_dir(), &old_image));
}

#[test]
fn update_remove_flag_tolerates_already_missing_file() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let created = service
        .store(form_with_image(
            "Maria",
            "Governor",
            fixture.upload("portrait.png", PNG_BYTES),
        ))
        .unwrap();
    let old_image = service
        .find(created.official_id)
        .unwrap()
        .profile_image
        .unwrap();
    std::fs::remove_file(fixture.upload_dir().join(&old_image)).unwrap();

    let mut input = form("Maria", "Governor");
    input.remove_image = true;
    service.update(created.official_id, input).unwrap();

    assert!(service
        .find(created.official_id)
        .unwrap()
        .profile_image
        .is_none());
}

#[test]
fn update_without_image_changes_keeps_existing_file() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let created = service
        .store(form_with_image(
            "Pedro",
            "Governor",
            fixture.upload("portrait.jpeg", JPEG_BYTES),
        ))
        .unwrap();
    let image = service
        .find(created.official_id)
        .unwrap()
        .profile_image
        .unwrap();

    service
        .update(
            created.official_id,
            form("Pedro Reyes", "SK Federation President"),
        )
        .unwrap();

    let official = service.find(created.official_id).unwrap();
    assert_eq!(official.profile_image.as_deref(), Some(image.as_str()));
    assert_eq!(official.name, "Pedro Reyes");
    assert!(file_exists(&fixture.upload_dir(), &image));
}

#[test]
fn update_missing_official_is_not_found_and_keeps_upload() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let upload = fixture.upload("portrait.png", PNG_BYTES);
    let incoming_path = upload.path.clone();

    let err = service
        .update(404, form_with_image("Ghost", "Governor", upload))
        .unwrap_err();

    assert!(matches!(err, OfficialServiceError::NotFound(404)));
    assert!(incoming_path.exists());
    assert!(fixture.stored_files().is_empty());
}

#[test]
fn update_validation_failure_changes_nothing() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let created = service
        .store(form_with_image(
            "Juan",
            "Governor",
            fixture.upload("portrait.png", PNG_BYTES),
        ))
        .unwrap();
    let before = service.find(created.official_id).unwrap();

    let mut input = form("", "Governor");
    input.remove_image = true;
    let err = service.update(created.official_id, input).unwrap_err();
    assert!(matches!(err, OfficialServiceError::Validation(errors) if errors.has("name")));

    let after = service.find(created.official_id).unwrap();
    assert_eq!(after, before);
    assert!(file_exists(
        &fixture.upload_dir(),
        after.profile_image.as_deref().unwrap()
    ));
}

#[test]
fn destroy_removes_row_and_owned_file() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let created = service
        .store(form_with_image(
            "Juan",
            "Governor",
            fixture.upload("portrait.png", PNG_BYTES),
        ))
        .unwrap();
    let image = service
        .find(created.official_id)
        .unwrap()
        .profile_image
        .unwrap();

    let outcome = service.destroy(created.official_id).unwrap();
    assert_eq!(outcome.kind, ActionKind::Deleted);
    assert_eq!(outcome.message, MESSAGE_DELETED);

    assert!(matches!(
        service.find(created.official_id),
        Err(OfficialServiceError::NotFound(_))
    ));
    assert!(!file_exists(&fixture.upload_dir(), &image));
}

#[test]
fn destroy_tolerates_missing_file_but_not_missing_row() {
    let fixture = Fixture::new();
    let service = fixture.service();
    let created = service
        .store(form_with_image(
            "Juan",
            "Governor",
            fixture.upload("portrait.png", PNG_BYTES),
        ))
        .unwrap();
    let image = service
        .find(created.official_id)
        .unwrap()
        .profile_image
        .unwrap();
    std::fs::remove_file(fixture.upload_dir().join(image)).unwrap();

    service.destroy(created.official_id).unwrap();
    let err = service.destroy(created.official_id).unwrap_err();
    assert!(matches!(err, OfficialServiceError::NotFound(id) if id == created.official_id));
}

#[test]
fn list_echoes_filters_and_positions() {
    let fixture = Fixture::new();
    let service = fixture.service();
    service.store(form("Juan", "Governor")).unwrap();
    service.store(form("Maria", "Governor")).unwrap();
    service.store(form("Juana", "Vice Governor")).unwrap();

    let listing = service
        .list(&OfficialListQuery {
            position: Some("Governor".to_string()),
            search: Some("an".to_string()),
        })
        .unwrap();

    let names = listing
        .officials
        .iter()
        .map(|official| official.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["Juan"]);
    assert_eq!(listing.filters.position.as_deref(), Some("Governor"));
    assert_eq!(listing.filters.search.as_deref(), Some("an"));
    assert_eq!(listing.positions.len(), 8);
    assert_eq!(listing.positions[0], "Governor");
    assert_eq!(listing.positions[7], "SK Federation President");
}

#[test]
fn listing_serializes_for_hosts() {
    let fixture = Fixture::new();
    let service = fixture.service();
    service.store(form("Juan", "Governor")).unwrap();

    let listing = service.list(&OfficialListQuery::default()).unwrap();
    let json = serde_json::to_value(&listing).unwrap();

    assert_eq!(json["officials"][0]["name"], "Juan");
    assert!(json["officials"][0]["profile_image"].is_null());
    assert_eq!(json["filters"], serde_json::json!({}));
    assert_eq!(json["positions"].as_array().unwrap().len(), 8);
}

#[test]
fn failed_insert_discards_moved_image() {
    let fixture = Fixture::new();
    let service = OfficialService::new(
        FailingWrites {
            inner: SqliteOfficialRepository::new(&fixture.conn),
        },
        ImageStore::new(fixture.upload_dir()),
    );

    let err = service
        .store(form_with_image(
            "Juan",
            "Governor",
            fixture.upload("portrait.png", PNG_BYTES),
        ))
        .unwrap_err();

    assert!(matches!(err, OfficialServiceError::Repo(_)));
    assert!(fixture.upload_dir().is_dir());
    assert!(fixture.stored_files().is_empty());
}

#[test]
fn failed_update_discards_new_image_and_keeps_old_one() {
    let fixture = Fixture::new();
    let created = fixture
        .service()
        .store(form_with_image(
            "Juan",
            "Governor",
            fixture.upload("old.png", PNG_BYTES),
        ))
        .unwrap();
    let old_image = fixture
        .service()
        .find(created.official_id)
        .unwrap()
        .profile_image
        .unwrap();

    let failing = OfficialService::new(
        FailingWrites {
            inner: SqliteOfficialRepository::new(&fixture.conn),
        },
        ImageStore::new(fixture.upload_dir()),
    );
    let err = failing
        .update(
            created.official_id,
            form_with_image("Juan", "Governor", fixture.upload("new.jpg", JPEG_BYTES)),
        )
        .unwrap_err();

    assert!(matches!(err, OfficialServiceError::Repo(_)));
    assert_eq!(fixture.stored_files(), [old_image]);
}

#[test]
fn unsafe_stored_names_are_skipped_on_remove_and_destroy() {
    let fixture = Fixture::new();
    let repo = SqliteOfficialRepository::new(&fixture.conn);
    let cleared = repo
        .create_official(&NewOfficial {
            name: "Legacy".to_string(),
            position: Position::Governor,
            profile_image: Some("../outside.png".to_string()),
        })
        .unwrap();
    let deleted = repo
        .create_official(&NewOfficial {
            name: "Legacy Two".to_string(),
            position: Position::Governor,
            profile_image: Some("nested/inside.png".to_string()),
        })
        .unwrap();
    let service = fixture.service();

    let mut input = form("Legacy", "Governor");
    input.remove_image = true;
    service.update(cleared, input).unwrap();
    assert!(service.find(cleared).unwrap().profile_image.is_none());

    service.destroy(deleted).unwrap();
    assert!(matches!(
        service.find(deleted),
        Err(OfficialServiceError::NotFound(_))
    ));
}

#[test]
fn listing_echoes_trimmed_filters() {
    let fixture = Fixture::new();
    let service = fixture.service();
    service.store(form("Ana", "Governor")).unwrap();

    let listing = service
        .list(&OfficialListQuery {
            position: Some("  ".to_string()),
            search: Some("na ".to_string()),
        })
        .unwrap();

    assert_eq!(listing.officials.len(), 1);
    assert_eq!(listing.filters.search.as_deref(), Some("na"));
    assert!(listing.filters.position.is_none());
}
