//! Action sequencing and background pipeline bookkeeping.

use strum_macros::{AsRefStr, Display};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use zip_map_ai::Insights;
use zip_map_census_models::{Boundary, LatLng, ZipCode};
use zip_map_places::PlacesOutcome;

use crate::services::Services;
use crate::state::{Comparison, PipelineStatus, Theme, ViewState};
use crate::SessionError;

/// Shown when a position resolves to no ZIP code.
pub const NO_ZIP_FOR_LOCATION: &str = "Could not determine ZIP code for your location.";

/// The independent pipelines a [`Controller`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Pipeline {
    /// Demographics, cities, and boundary.
    Search,
    /// Places inside the boundary.
    Places,
    /// A comparison ZIP boundary.
    Comparison,
    /// AI profile and doppelgangers.
    Insights,
}

/// Completion of a background task.
#[derive(Debug)]
enum PipelineEvent {
    Places {
        generation: u64,
        result: Result<PlacesOutcome, SessionError>,
    },
    Insights {
        request_id: u64,
        zip: ZipCode,
        result: Result<Insights, SessionError>,
    },
}

#[derive(Debug)]
struct InsightRequest {
    id: u64,
    token: CancellationToken,
}

/// Owns the view state and runs every pipeline that changes it.
///
/// Foreground actions (`search`, `locate`, `show_on_map`) complete before
/// returning. Places and insights run as background tasks; their results
/// are applied when the caller drains events with [`Self::next_event`],
/// [`Self::drain_events`], or [`Self::settle`].
pub struct Controller {
    state: ViewState,
    services: Services,
    events_tx: mpsc::UnboundedSender<PipelineEvent>,
    events_rx: mpsc::UnboundedReceiver<PipelineEvent>,
    pending: usize,
    generation: u64,
    next_request_id: u64,
    insight_request: Option<InsightRequest>,
}

impl Controller {
    /// Creates a controller with empty state.
    #[must_use]
    pub fn new(services: Services) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            state: ViewState::default(),
            services,
            events_tx,
            events_rx,
            pending: 0,
            generation: 0,
            next_request_id: 0,
            insight_request: None,
        }
    }

    /// The current view state.
    #[must_use]
    pub const fn state(&self) -> &ViewState {
        &self.state
    }

    /// Number of background tasks whose results haven't been applied yet.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }

    /// Looks up a ZIP code.
    ///
    /// Input that isn't exactly five digits fails the search pipeline
    /// without touching existing data or calling any service. Otherwise all
    /// results are cleared, demographics, cities, and boundary are fetched
    /// concurrently, and a places search is started in the background. If
    /// any of the three fetches fails, every result field stays empty.
    pub async fn search(&mut self, input: &str) {
        let zip = match ZipCode::parse(input) {
            Ok(zip) => zip,
            Err(e) => {
                log::debug!("Rejected search input {input:?}");
                self.state.search = PipelineStatus::Failed(e.to_string());
                return;
            }
        };

        self.clear_results();
        self.generation += 1;
        self.state.search = PipelineStatus::Loading;

        log::info!("Searching ZIP {zip}");

        let services = &self.services;
        let result = tokio::try_join!(
            services.demographics.fetch_demographics(&zip),
            services.cities.cities_for_zip(&zip),
            services.boundaries.fetch_boundary(&zip),
        );

        match result {
            Ok((demographics, cities, boundary)) => {
                self.state.zip_code = Some(zip.clone());
                self.state.demographics = Some(demographics);
                self.state.cities = cities;
                self.state.boundary = Some(boundary.clone());
                self.state.search = PipelineStatus::Ready;

                self.spawn_places(zip, boundary);
            }
            Err(e) => {
                log::warn!("Search for {zip} failed: {e}");
                self.clear_results();
                self.state.search = PipelineStatus::Failed(e.to_string());
            }
        }
    }

    /// Resolves a position to a ZIP code and searches it.
    ///
    /// With `None` the locator's current-position source is used.
    pub async fn locate(&mut self, coordinates: Option<LatLng>) {
        self.state.search = PipelineStatus::Loading;

        match self.services.locator.locate_zip(coordinates).await {
            Ok(Some(zip)) => self.search(zip.as_str()).await,
            Ok(None) => {
                log::info!("No ZIP code found for location {coordinates:?}");
                self.state.search = PipelineStatus::Failed(NO_ZIP_FOR_LOCATION.to_string());
            }
            Err(e) => {
                log::warn!("Location lookup failed: {e}");
                self.state.search = PipelineStatus::Failed(e.to_string());
            }
        }
    }

    /// Draws a second ZIP code's boundary next to the primary one.
    ///
    /// The primary boundary is never replaced. On failure any previous
    /// comparison is kept and the comparison pipeline reports the error.
    pub async fn show_on_map(&mut self, input: &str) {
        let fail = |message: &dyn std::fmt::Display| {
            PipelineStatus::Failed(format!(
                "Could not fetch data for comparison ZIP {input}: {message}"
            ))
        };

        let zip = match ZipCode::parse(input) {
            Ok(zip) => zip,
            Err(e) => {
                self.state.comparison_status = fail(&e);
                return;
            }
        };

        self.state.comparison_status = PipelineStatus::Loading;

        match self.services.boundaries.fetch_boundary(&zip).await {
            Ok(boundary) => {
                log::info!("Showing comparison ZIP {zip}");
                self.state.comparison = Some(Comparison {
                    zip_code: zip,
                    boundary,
                });
                self.state.comparison_status = PipelineStatus::Ready;
            }
            Err(e) => {
                log::warn!("Comparison boundary for {zip} failed: {e}");
                self.state.comparison_status = fail(&e);
            }
        }
    }

    /// Starts an AI insight request for the current ZIP code.
    ///
    /// Does nothing without a current ZIP. A request already in flight is
    /// cancelled first.
    pub fn request_insights(&mut self) {
        let Some(zip) = self.state.zip_code.clone() else {
            log::debug!("Ignoring insight request with no ZIP code selected");
            return;
        };

        if let Some(previous) = self.insight_request.take() {
            log::debug!("Cancelling superseded insight request {}", previous.id);
            previous.token.cancel();
        }

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let token = CancellationToken::new();

        self.state.insights_status = PipelineStatus::Loading;

        let source = self.services.insights.clone();
        let tx = self.events_tx.clone();
        let task_token = token.clone();
        self.pending += 1;

        tokio::spawn(async move {
            let task_zip = zip.clone();
            let result = run_isolated(async move {
                source.fetch_insights(&task_zip, &task_token).await
            })
            .await
            .map(Insights::from);
            let _ = tx.send(PipelineEvent::Insights {
                request_id,
                zip,
                result,
            });
        });

        self.insight_request = Some(InsightRequest {
            id: request_id,
            token,
        });
    }

    /// Cancels the in-flight insight request, if any.
    ///
    /// This is not a failure: no error is recorded and no insight data is
    /// set.
    pub fn cancel_insights(&mut self) {
        if let Some(request) = self.insight_request.take() {
            log::info!("Cancelling insight request {}", request.id);
            request.token.cancel();
            self.state.insights_status = PipelineStatus::Idle;
        }
    }

    /// Waits for the next background result and applies it.
    ///
    /// Returns the pipeline it belonged to, or `None` when nothing is
    /// pending.
    pub async fn next_event(&mut self) -> Option<Pipeline> {
        if self.pending == 0 {
            return None;
        }

        let event = self.events_rx.recv().await?;
        Some(self.apply(event))
    }

    /// Applies every background result that has already arrived, without
    /// waiting. Returns how many were applied.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;

        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }

        applied
    }

    /// Waits until every background task has reported back.
    pub async fn settle(&mut self) {
        while self.next_event().await.is_some() {}
    }

    /// Switches between light and dark themes.
    pub const fn toggle_theme(&mut self) -> Theme {
        self.state.chrome.theme = self.state.chrome.theme.toggled();
        self.state.chrome.theme
    }

    /// Expands or collapses the results panel.
    pub const fn set_panel_open(&mut self, open: bool) {
        self.state.chrome.panel_open = open;
    }

    /// Flips the results panel.
    pub const fn toggle_panel(&mut self) {
        self.state.chrome.panel_open = !self.state.chrome.panel_open;
    }

    /// Hides the welcome message.
    pub const fn dismiss_welcome(&mut self) {
        self.state.chrome.welcome_open = false;
    }

    /// Shows the welcome message again.
    pub const fn show_welcome(&mut self) {
        self.state.chrome.welcome_open = true;
    }

    /// Opens the data sources dialog.
    pub const fn show_about(&mut self) {
        self.state.chrome.about_open = true;
    }

    /// Closes the data sources dialog.
    pub const fn hide_about(&mut self) {
        self.state.chrome.about_open = false;
    }

    /// Selects the place with `id` from the current results.
    ///
    /// Returns `false`, leaving the selection unchanged, if no such place
    /// is loaded.
    pub fn select_place(&mut self, id: &str) -> bool {
        let found = self
            .state
            .places
            .as_ref()
            .and_then(|places| places.iter().find(|p| p.id == id))
            .cloned();

        match found {
            Some(place) => {
                self.state.selected_place = Some(place);
                true
            }
            None => false,
        }
    }

    /// Clears the place selection.
    pub fn clear_selected_place(&mut self) {
        self.state.selected_place = None;
    }

    fn clear_results(&mut self) {
        if let Some(request) = self.insight_request.take() {
            request.token.cancel();
        }
        self.state.clear_results();
    }

    fn spawn_places(&mut self, zip: ZipCode, boundary: Boundary) {
        self.state.places_status = PipelineStatus::Loading;

        let generation = self.generation;
        let source = self.services.places.clone();
        let tester = self.services.tester.clone();
        let tx = self.events_tx.clone();
        self.pending += 1;

        tokio::spawn(async move {
            let result = run_isolated(async move {
                source
                    .search_within(&boundary, &zip, tester.as_deref())
                    .await
            })
            .await;
            let _ = tx.send(PipelineEvent::Places { generation, result });
        });
    }

    fn apply(&mut self, event: PipelineEvent) -> Pipeline {
        self.pending = self.pending.saturating_sub(1);

        match event {
            PipelineEvent::Places { generation, result } => {
                self.apply_places(generation, result);
                Pipeline::Places
            }
            PipelineEvent::Insights {
                request_id,
                zip,
                result,
            } => {
                self.apply_insights(request_id, &zip, result);
                Pipeline::Insights
            }
        }
    }

    fn apply_places(&mut self, generation: u64, result: Result<PlacesOutcome, SessionError>) {
        if generation != self.generation {
            log::debug!("Discarding places from superseded search {generation}");
            return;
        }

        match result {
            Ok(outcome) => {
                log::info!(
                    "Loaded {} place(s) ({} precision)",
                    outcome.places.len(),
                    outcome.precision
                );
                self.state.places = Some(outcome.places);
                self.state.places_precision = Some(outcome.precision);
                self.state.places_status = PipelineStatus::Ready;
            }
            Err(e) => {
                log::warn!("Places search failed: {e}");
                self.state.places = None;
                self.state.places_precision = None;
                self.state.places_status =
                    PipelineStatus::Failed(format!("Could not fetch places: {e}"));
            }
        }
    }

    fn apply_insights(
        &mut self,
        request_id: u64,
        zip: &ZipCode,
        result: Result<Insights, SessionError>,
    ) {
        if self.insight_request.as_ref().is_none_or(|r| r.id != request_id) {
            log::debug!("Discarding result of stale insight request {request_id}");
            return;
        }
        if matches!(&result, Err(e) if e.is_cancelled()) {
            return;
        }

        self.insight_request = None;

        if self.state.zip_code.as_ref() != Some(zip) {
            log::debug!("Discarding insights for {zip}, no longer the current ZIP");
            self.state.insights_status = PipelineStatus::Idle;
            return;
        }

        match result {
            Ok(insights) => {
                self.state.insights = Some(insights);
                self.state.insights_status = PipelineStatus::Ready;
            }
            Err(e) => {
                log::warn!("Insight request for {zip} failed: {e}");
                self.state.insights_status = PipelineStatus::Failed(e.to_string());
            }
        }
    }
}

/// Runs `work` on its own task, so a panic inside a service still yields
/// a result and the pipeline's event is always sent.
async fn run_isolated<T, F>(work: F) -> Result<T, SessionError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, SessionError>> + Send + 'static,
{
    tokio::spawn(work).await.unwrap_or_else(|e| {
        log::error!("Background task failed: {e}");
        Err(e.into())
    })
}
