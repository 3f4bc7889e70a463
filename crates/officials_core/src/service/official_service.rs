//! Provincial official use-case service.
//!
//! # Responsibility
//! - Orchestrate validation, image placement/cleanup and persistence for
//!   the list/store/update/destroy admin actions.
//! - Return host-agnostic results (`OfficialListing`, `ActionOutcome`).
//!
//! # Invariants
//! - Validation and id resolution run before any file or row is touched.
//! - A stored `profile_image` always names a file in the image store; the
//!   previous file is removed whenever it is replaced or cleared.
//! - File and row changes are not atomic. A crash between them may leave an
//!   orphaned file or a row pointing at a missing file.

use crate::model::official::{NewOfficial, Official, OfficialId, Position};
use crate::model::validation::{OfficialForm, ValidationErrors};
use crate::repo::official_repo::{OfficialListQuery, OfficialRepository, RepoError};
use crate::storage::{ImageStore, StorageError};
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MESSAGE_CREATED: &str = "Provincial official added successfully.";
pub const MESSAGE_UPDATED: &str = "Provincial official updated successfully.";
pub const MESSAGE_DELETED: &str = "Provincial official deleted successfully.";

pub type ServiceResult<T> = Result<T, OfficialServiceError>;

/// Service error for official use-cases.
#[derive(Debug)]
pub enum OfficialServiceError {
    /// One or more form fields failed validation.
    Validation(ValidationErrors),
    /// Target official does not exist.
    NotFound(OfficialId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Upload directory failure.
    Storage(StorageError),
}

impl Display for OfficialServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "validation failed: {errors}"),
            Self::NotFound(id) => write!(f, "provincial official not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OfficialServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::NotFound(_) => None,
            Self::Repo(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<RepoError> for OfficialServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<StorageError> for OfficialServiceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<ValidationErrors> for OfficialServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Filters echoed back with a listing; blank values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// Listing payload for the admin screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficialListing {
    pub officials: Vec<Official>,
    pub filters: ListingFilters,
    /// Every selectable position label, in display order.
    pub positions: Vec<&'static str>,
}

/// Which mutation an `ActionOutcome` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Created,
    Updated,
    Deleted,
}

/// Successful mutation result; the host decides how to render it
/// (redirect plus flash banner, JSON, terminal line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    pub official_id: OfficialId,
    pub message: &'static str,
}

/// Use-case service for provincial official records.
pub struct OfficialService<R: OfficialRepository> {
    repo: R,
    images: ImageStore,
}

impl<R: OfficialRepository> OfficialService<R> {
    /// Creates a service over a repository and the injected image store.
    pub fn new(repo: R, images: ImageStore) -> Self {
        Self { repo, images }
    }

    /// Lists officials matching the optional filters.
    pub fn list(&self, query: &OfficialListQuery) -> ServiceResult<OfficialListing> {
        let officials = self.repo.list_officials(query)?;
        info!(
            "event=officials_list module=service status=ok count={} position_filter={} search_filter={}",
            officials.len(),
            is_filled(query.position.as_deref()),
            is_filled(query.search.as_deref())
        );

        Ok(OfficialListing {
            officials,
            filters: ListingFilters {
                search: echo(query.search.as_deref()),
                position: echo(query.position.as_deref()),
            },
            positions: Position::labels(),
        })
    }

    /// Resolves one official by id.
    pub fn find(&self, id: OfficialId) -> ServiceResult<Official> {
        self.repo
            .get_official(id)?
            .ok_or(OfficialServiceError::NotFound(id))
    }

    /// Validates the form, stores the optional image, then inserts the row.
    pub fn store(&self, form: OfficialForm) -> ServiceResult<ActionOutcome> {
        let validated = form.validate().inspect_err(log_validation_failure)?;

        self.images.ensure_dir()?;
        let profile_image = match &validated.profile_image {
            Some(upload) => Some(self.images.store(upload)?),
            None => None,
        };

        let new_official = NewOfficial {
            name: validated.name,
            position: validated.position,
            profile_image,
        };
        let id = match self.repo.create_official(&new_official) {
            Ok(id) => id,
            Err(err) => {
                self.discard_new_image(new_official.profile_image.as_deref());
                return Err(err.into());
            }
        };

        info!(
            "event=official_store module=service status=ok id={id} has_image={}",
            new_official.profile_image.is_some()
        );
        Ok(ActionOutcome {
            kind: ActionKind::Created,
            official_id: id,
            message: MESSAGE_CREATED,
        })
    }

    /// Applies name/position changes and the image replace/remove rules.
    ///
    /// A supplied image wins over `remove_image`; with neither, the stored
    /// image is left as is.
    pub fn update(&self, id: OfficialId, form: OfficialForm) -> ServiceResult<ActionOutcome> {
        let mut official = self.find(id)?;
        let validated = form.validate().inspect_err(log_validation_failure)?;

        let previous_image = official.profile_image.clone();
        let mut stale_image = None;
        let mut image_action = "kept";

        if let Some(upload) = &validated.profile_image {
            official.profile_image = Some(self.images.store(upload)?);
            stale_image = previous_image;
            image_action = "replaced";
        } else if validated.remove_image {
            official.profile_image = None;
            stale_image = previous_image;
            image_action = "removed";
        }

        official.name = validated.name;
        official.position = validated.position.label().to_string();

        if let Err(err) = self.repo.update_official(&official) {
            if validated.profile_image.is_some() {
                self.discard_new_image(official.profile_image.as_deref());
            }
            return Err(err.into());
        }

        if let Some(file_name) = stale_image {
            self.remove_owned_image(&file_name)?;
        }

        info!("event=official_update module=service status=ok id={id} image={image_action}");
        Ok(ActionOutcome {
            kind: ActionKind::Updated,
            official_id: id,
            message: MESSAGE_UPDATED,
        })
    }

    /// Removes the owned image (if any) and then the row.
    pub fn destroy(&self, id: OfficialId) -> ServiceResult<ActionOutcome> {
        let official = self.find(id)?;

        if let Some(file_name) = official.profile_image.as_deref() {
            self.remove_owned_image(file_name)?;
        }
        self.repo.delete_official(id)?;

        info!("event=official_destroy module=service status=ok id={id}");
        Ok(ActionOutcome {
            kind: ActionKind::Deleted,
            official_id: id,
            message: MESSAGE_DELETED,
        })
    }

    /// Deletes a file owned by a row; names that cannot live in the upload
    /// directory are logged and skipped so the row change still goes through.
    fn remove_owned_image(&self, file_name: &str) -> ServiceResult<()> {
        match self.images.remove(file_name) {
            Err(StorageError::InvalidFileName(_)) => {
                warn!(
                    "event=image_remove module=service status=skipped error_code=invalid_file_name"
                );
                Ok(())
            }
            other => other.map_err(OfficialServiceError::from),
        }
    }

    fn discard_new_image(&self, file_name: Option<&str>) {
        let Some(file_name) = file_name else {
            return;
        };
        if let Err(err) = self.images.remove(file_name) {
            warn!(
                "event=image_cleanup module=service status=error error_code=orphaned_upload error={err}"
            );
        }
    }
}

fn log_validation_failure(errors: &ValidationErrors) {
    let fields = errors
        .iter()
        .map(|(field, _)| field)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(",");
    info!("event=official_validate module=service status=rejected fields={fields}");
}

fn is_filled(value: Option<&str>) -> bool {
    echo(value).is_some()
}

fn echo(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
