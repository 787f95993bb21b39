use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::dispatch::MovieDispatch;
use crate::graphql::MovieApi;
use crate::models::{DraftMode, FieldEdit, FieldId, MovieDraft, MovieRecord};
use crate::validation::{description_hint, rating_hint, title_hint, year_hint, Severity};

const FORM_HEADING: &str = "New movie";

/// Inputs the host hands to the form on every render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormProps {
    pub show: bool,
    pub movie: Option<MovieRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormAction {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Textarea,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub id: FieldId,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub kind: InputKind,
    pub value: String,
    pub severity: Option<Severity>,
    pub help: Option<&'static str>,
}

/// Everything a front end needs to draw the dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub visible: bool,
    pub heading: &'static str,
    pub fields: Vec<FieldView>,
    pub poster_preview: Option<String>,
    pub action: FormAction,
}

impl FormView {
    pub fn field(&self, id: FieldId) -> Option<&FieldView> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// Headless controller for the create/update movie dialog.
#[derive(Debug, Default)]
pub struct MovieFormController {
    draft: MovieDraft,
    show: bool,
    reconciled: Option<MovieRecord>,
}

impl MovieFormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &MovieDraft {
        &self.draft
    }

    pub fn is_visible(&self) -> bool {
        self.show
    }

    /// Syncs the form with the host's inputs. A new or changed record replaces
    /// the draft wholesale; losing the record drops back to an empty draft;
    /// unchanged props keep in-progress edits.
    pub fn receive_props(&mut self, props: FormProps) {
        self.show = props.show;
        match props.movie {
            Some(record) => {
                if self.reconciled.as_ref() != Some(&record) {
                    debug!("Loading movie '{}' into form", record.id);
                    self.draft = MovieDraft::from_record(&record);
                    self.reconciled = Some(record);
                }
            }
            None => {
                if self.reconciled.take().is_some() {
                    debug!("Movie input removed, resetting form");
                    self.draft = MovieDraft::empty();
                }
            }
        }
    }

    pub fn edit_field(&mut self, edit: FieldEdit) {
        self.draft = self.draft.with_edit(edit);
    }

    pub fn action(&self) -> FormAction {
        match self.draft.mode {
            DraftMode::Creating => FormAction::Create,
            DraftMode::Editing(_) => FormAction::Update,
        }
    }

    pub fn view(&self, current_year: i32) -> FormView {
        let d = &self.draft;
        let fields = vec![
            FieldView {
                id: FieldId::Title,
                label: "Title",
                placeholder: "Title",
                kind: InputKind::Text,
                value: d.title.clone(),
                severity: Some(title_hint(&d.title)),
                help: Some("More than 5 characters"),
            },
            FieldView {
                id: FieldId::Description,
                label: "Description",
                placeholder: "Description",
                kind: InputKind::Textarea,
                value: d.description.clone(),
                severity: Some(description_hint(&d.description)),
                help: Some("More than 50 characters"),
            },
            FieldView {
                id: FieldId::Year,
                label: "Year",
                placeholder: "Year",
                kind: InputKind::Number,
                value: number_text(d.year),
                severity: Some(year_hint(d.year, current_year)),
                help: Some("Cannot add films that has been not released"),
            },
            FieldView {
                id: FieldId::Rating,
                label: "Rating",
                placeholder: "Rating",
                kind: InputKind::Number,
                value: number_text(d.rating),
                severity: Some(rating_hint(d.rating)),
                help: Some("0 - 10"),
            },
            FieldView {
                id: FieldId::PosterImage,
                label: "Poster",
                placeholder: "Poster image url",
                kind: InputKind::Text,
                value: d.poster_image_url.clone(),
                severity: None,
                help: None,
            },
        ];
        let poster_preview = Some(d.poster_image_url.clone()).filter(|url| !url.is_empty());

        FormView {
            visible: self.show,
            heading: FORM_HEADING,
            fields,
            poster_preview,
            action: self.action(),
        }
    }

    /// Sends the draft through `dispatch` and closes the form straight away.
    /// Severity hints are not consulted.
    pub fn submit(&mut self, dispatch: &dyn MovieDispatch, on_hide: impl FnOnce()) {
        match self.draft.mode.clone() {
            DraftMode::Creating => {
                info!("Submitting new movie '{}'", self.draft.title);
                dispatch.add_movie(self.draft.to_new_movie());
            }
            DraftMode::Editing(id) => {
                info!("Submitting update for movie {}", id);
                dispatch.update_movie(self.draft.to_update(id));
            }
        }
        on_hide();
        self.close();
    }

    /// Like [`submit`](Self::submit) but waits for the backend. The form only
    /// closes when the mutation succeeds; on failure the draft is kept and the
    /// error returned.
    pub async fn submit_confirmed(
        &mut self,
        api: &dyn MovieApi,
        on_hide: impl FnOnce(),
    ) -> Result<MovieRecord> {
        let saved = match self.draft.mode.clone() {
            DraftMode::Creating => api.add_movie(self.draft.to_new_movie()).await?,
            DraftMode::Editing(id) => api.update_movie(self.draft.to_update(id)).await?,
        };
        info!("Saved movie '{}' ({})", saved.title, saved.id);
        on_hide();
        self.close();
        Ok(saved)
    }

    /// Hides the dialog and discards the draft.
    pub fn close(&mut self) {
        self.show = false;
        self.draft = MovieDraft::empty();
        self.reconciled = None;
    }
}

fn number_text(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
