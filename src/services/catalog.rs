//! Movies, series, matches and hero slides: the write paths that carry more
//! than a plain repository call (slug conflicts, SEO defaults, enrichment, events).

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

use crate::constants::limits::{FINISHED_MATCHES_SHOWN, SEO_DESCRIPTION_CHARS};
use crate::db::Store;
use crate::db::repositories::hero_slide::HeroSlide;
use crate::db::repositories::matches::{Match, MatchFilter, MatchPatch, NewMatch};
use crate::db::repositories::movie::{Movie, MoviePatch, NewMovie};
use crate::db::repositories::series::{
    Episode, EpisodePatch, NewEpisode, NewSeries, Series, SeriesPatch,
};
use crate::domain::events::NotificationEvent;
use crate::domain::slug::slugify;
use crate::domain::{MatchStatus, SlideContentType};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupedMatches {
    pub live: Vec<Match>,
    pub upcoming: Vec<Match>,
    pub finished: Vec<Match>,
    pub premium: Vec<Match>,
}

#[must_use]
pub fn default_seo_title(title: &str, is_dubbed: bool) -> String {
    if is_dubbed {
        format!("Daawo {title} Af-Somali Online | Fanbroj")
    } else {
        format!("Daawo {title} Online | Fanbroj")
    }
}

#[must_use]
pub fn default_seo_description(overview: &str) -> String {
    let head: String = overview.chars().take(SEO_DESCRIPTION_CHARS).collect();
    format!("{head}...")
}

/// Split matches into the home-page buckets.
#[must_use]
pub fn group_matches(mut matches: Vec<Match>) -> GroupedMatches {
    matches.sort_by_key(|m| m.kickoff_at);

    let live: Vec<Match> = matches
        .iter()
        .filter(|m| m.status == MatchStatus::Live)
        .cloned()
        .collect();
    let upcoming: Vec<Match> = matches
        .iter()
        .filter(|m| m.status == MatchStatus::Upcoming)
        .cloned()
        .collect();
    let mut finished: Vec<Match> = matches
        .iter()
        .filter(|m| m.status == MatchStatus::Finished)
        .cloned()
        .collect();
    finished.reverse();
    finished.truncate(FINISHED_MATCHES_SHOWN);
    let premium = matches
        .into_iter()
        .filter(|m| m.is_premium && m.status != MatchStatus::Finished)
        .collect();

    GroupedMatches {
        live,
        upcoming,
        finished,
        premium,
    }
}

/// Fields a hero slide borrows from the title it points at.
struct SlideSource<'a> {
    title: &'a str,
    subtitle: Option<&'a String>,
    description: Option<&'a String>,
    backdrop_url: Option<&'a String>,
    poster_url: Option<&'a String>,
    link: String,
}

impl<'a> SlideSource<'a> {
    fn movie(movie: &'a Movie) -> Self {
        Self {
            title: &movie.title,
            subtitle: movie.title_somali.as_ref(),
            description: movie.overview.as_ref(),
            backdrop_url: movie.backdrop_url.as_ref(),
            poster_url: movie.poster_url.as_ref(),
            link: format!("/movies/{}", movie.slug),
        }
    }

    fn series(series: &'a Series) -> Self {
        Self {
            title: &series.title,
            subtitle: series.title_somali.as_ref(),
            description: series.overview.as_ref(),
            backdrop_url: series.backdrop_url.as_ref(),
            poster_url: series.poster_url.as_ref(),
            link: format!("/series/{}", series.slug),
        }
    }
}

fn enrich_slide(mut slide: HeroSlide, source: SlideSource<'_>) -> HeroSlide {
    slide.title = slide.title.or_else(|| Some(source.title.to_string()));
    slide.subtitle = slide.subtitle.or_else(|| source.subtitle.cloned());
    slide.description = slide.description.or_else(|| source.description.cloned());
    slide.image_url = slide
        .image_url
        .or_else(|| source.backdrop_url.cloned())
        .or_else(|| source.poster_url.cloned());
    slide.cta_link = slide.cta_link.or(Some(source.link));
    slide
}

#[derive(Debug, Clone, Serialize)]
pub struct Season {
    pub season_number: i32,
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesDetail {
    #[serde(flatten)]
    pub series: Series,
    pub seasons: Vec<Season>,
}

/// Buckets episodes already ordered by season and episode number.
#[must_use]
pub fn group_seasons(episodes: Vec<Episode>) -> Vec<Season> {
    let mut seasons: Vec<Season> = Vec::new();
    for episode in episodes {
        match seasons.last_mut() {
            Some(season) if season.season_number == episode.season_number => {
                season.episodes.push(episode);
            }
            _ => seasons.push(Season {
                season_number: episode.season_number,
                episodes: vec![episode],
            }),
        }
    }
    seasons
}

pub struct CatalogService {
    store: Store,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl CatalogService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<NotificationEvent>) -> Self {
        Self { store, event_bus }
    }

    // ========================================================================
    // Movies
    // ========================================================================

    pub async fn create_movie(&self, mut input: NewMovie) -> Result<Movie, CatalogError> {
        input.slug = input.slug.trim().to_string();
        if input.slug.is_empty() || input.title.trim().is_empty() {
            return Err(CatalogError::Validation(
                "slug and title are required".to_string(),
            ));
        }
        if self.store.movies().slug_exists(&input.slug).await? {
            return Err(CatalogError::Conflict(format!(
                "Movie with slug '{}' already exists",
                input.slug
            )));
        }

        if input.seo_title.is_none() {
            input.seo_title = Some(default_seo_title(&input.title, input.is_dubbed));
        }
        if input.seo_description.is_none()
            && let Some(overview) = &input.overview
        {
            input.seo_description = Some(default_seo_description(overview));
        }

        let movie = self.store.movies().create(input).await?;
        info!(movie_id = movie.id, slug = %movie.slug, "Movie created");
        let _ = self.event_bus.send(NotificationEvent::MovieCreated {
            id: movie.id,
            slug: movie.slug.clone(),
            title: movie.title.clone(),
        });
        Ok(movie)
    }

    pub async fn update_movie(&self, id: i32, patch: MoviePatch) -> Result<Movie, CatalogError> {
        let movies = self.store.movies();
        let current = movies
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Movie {id}")))?;

        if let Some(slug) = &patch.slug
            && slug != &current.slug
            && movies.slug_exists(slug).await?
        {
            return Err(CatalogError::Conflict(format!(
                "Movie with slug '{slug}' already exists"
            )));
        }

        let movie = movies
            .update(id, patch)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Movie {id}")))?;
        let _ = self.event_bus.send(NotificationEvent::MovieUpdated {
            id: movie.id,
            slug: movie.slug.clone(),
        });
        Ok(movie)
    }

    pub async fn delete_movie(&self, id: i32) -> Result<(), CatalogError> {
        if !self.store.movies().delete(id).await? {
            return Err(CatalogError::NotFound(format!("Movie {id}")));
        }
        info!(movie_id = id, "Movie deleted");
        Ok(())
    }

    // ========================================================================
    // Series
    // ========================================================================

    /// Published series with its published episodes grouped by season.
    pub async fn series_detail(&self, slug: &str) -> Result<SeriesDetail, CatalogError> {
        let repo = self.store.series();
        let series = repo
            .get_by_slug(slug)
            .await?
            .filter(|s| s.is_published)
            .ok_or_else(|| CatalogError::NotFound(format!("Series {slug}")))?;
        let episodes = repo.episodes(series.id, true).await?;
        Ok(SeriesDetail {
            series,
            seasons: group_seasons(episodes),
        })
    }

    pub async fn create_series(&self, mut input: NewSeries) -> Result<Series, CatalogError> {
        if input.title.trim().is_empty() {
            return Err(CatalogError::Validation("title is required".to_string()));
        }
        input.slug = match input.slug.trim() {
            "" => slugify(&input.title),
            slug => slug.to_string(),
        };
        if input.slug.is_empty() {
            return Err(CatalogError::Validation("slug is required".to_string()));
        }
        if self.store.series().slug_exists(&input.slug).await? {
            return Err(CatalogError::Conflict(format!(
                "Series with slug '{}' already exists",
                input.slug
            )));
        }

        if input.seo_title.is_none() {
            input.seo_title = Some(default_seo_title(&input.title, input.is_dubbed));
        }
        if input.seo_description.is_none()
            && let Some(overview) = &input.overview
        {
            input.seo_description = Some(default_seo_description(overview));
        }

        let created = self.store.series().create(input).await?;
        info!(series_id = created.id, slug = %created.slug, "Series created");
        let _ = self.event_bus.send(NotificationEvent::SeriesCreated {
            id: created.id,
            slug: created.slug.clone(),
            title: created.title.clone(),
        });
        Ok(created)
    }

    pub async fn update_series(&self, id: i32, patch: SeriesPatch) -> Result<Series, CatalogError> {
        let repo = self.store.series();
        let current = repo
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Series {id}")))?;

        if let Some(slug) = &patch.slug
            && slug != &current.slug
            && repo.slug_exists(slug).await?
        {
            return Err(CatalogError::Conflict(format!(
                "Series with slug '{slug}' already exists"
            )));
        }

        let updated = repo
            .update(id, patch)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Series {id}")))?;
        let _ = self.event_bus.send(NotificationEvent::SeriesUpdated {
            id: updated.id,
            slug: updated.slug.clone(),
        });
        Ok(updated)
    }

    /// Removes the series along with its episodes.
    pub async fn delete_series(&self, id: i32) -> Result<(), CatalogError> {
        if !self.store.series().delete(id).await? {
            return Err(CatalogError::NotFound(format!("Series {id}")));
        }
        info!(series_id = id, "Series deleted");
        Ok(())
    }

    pub async fn create_episode(
        &self,
        series_id: i32,
        input: NewEpisode,
    ) -> Result<Episode, CatalogError> {
        if input.season_number < 1 || input.episode_number < 1 {
            return Err(CatalogError::Validation(
                "season_number and episode_number start at 1".to_string(),
            ));
        }
        let repo = self.store.series();
        if repo.get(series_id).await?.is_none() {
            return Err(CatalogError::NotFound(format!("Series {series_id}")));
        }
        if repo
            .episode_exists(series_id, input.season_number, input.episode_number)
            .await?
        {
            return Err(CatalogError::Conflict(format!(
                "S{:02}E{:02} already exists",
                input.season_number, input.episode_number
            )));
        }
        Ok(repo.create_episode(series_id, input).await?)
    }

    pub async fn update_episode(
        &self,
        id: i32,
        patch: EpisodePatch,
    ) -> Result<Episode, CatalogError> {
        let repo = self.store.series();
        let current = repo
            .get_episode(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Episode {id}")))?;

        let season = patch.season_number.unwrap_or(current.season_number);
        let number = patch.episode_number.unwrap_or(current.episode_number);
        if (season, number) != (current.season_number, current.episode_number)
            && repo.episode_exists(current.series_id, season, number).await?
        {
            return Err(CatalogError::Conflict(format!(
                "S{season:02}E{number:02} already exists"
            )));
        }

        repo.update_episode(id, patch)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Episode {id}")))
    }

    pub async fn delete_episode(&self, id: i32) -> Result<(), CatalogError> {
        if !self.store.series().delete_episode(id).await? {
            return Err(CatalogError::NotFound(format!("Episode {id}")));
        }
        Ok(())
    }

    // ========================================================================
    // Matches
    // ========================================================================

    pub async fn grouped_matches(&self) -> Result<GroupedMatches, CatalogError> {
        let all = self.store.matches().list(&MatchFilter::default()).await?;
        Ok(group_matches(all))
    }

    pub async fn create_match(&self, mut input: NewMatch) -> Result<Match, CatalogError> {
        input.slug = input.slug.trim().to_string();
        if input.slug.is_empty() {
            return Err(CatalogError::Validation("slug is required".to_string()));
        }
        if self.store.matches().slug_exists(&input.slug).await? {
            return Err(CatalogError::Conflict(format!(
                "Match with slug '{}' already exists",
                input.slug
            )));
        }

        let created = self.store.matches().create(input).await?;
        info!(match_id = created.id, slug = %created.slug, "Match created");
        let _ = self.event_bus.send(NotificationEvent::MatchCreated {
            id: created.id,
            slug: created.slug.clone(),
            title: created.title.clone(),
        });
        Ok(created)
    }

    pub async fn update_match(&self, id: i32, patch: MatchPatch) -> Result<Match, CatalogError> {
        let matches = self.store.matches();
        let current = matches
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Match {id}")))?;

        if let Some(slug) = &patch.slug
            && slug != &current.slug
            && matches.slug_exists(slug).await?
        {
            return Err(CatalogError::Conflict(format!(
                "Match with slug '{slug}' already exists"
            )));
        }

        let updated = matches
            .update(id, patch)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Match {id}")))?;
        let _ = self.event_bus.send(NotificationEvent::MatchUpdated {
            id: updated.id,
            slug: updated.slug.clone(),
        });
        Ok(updated)
    }

    pub async fn delete_match(&self, id: i32) -> Result<(), CatalogError> {
        if !self.store.matches().delete(id).await? {
            return Err(CatalogError::NotFound(format!("Match {id}")));
        }
        Ok(())
    }

    pub async fn bulk_update_status(
        &self,
        ids: Vec<i32>,
        status: MatchStatus,
    ) -> Result<u64, CatalogError> {
        if ids.is_empty() {
            return Err(CatalogError::Validation("ids cannot be empty".to_string()));
        }
        let updated = self.store.matches().bulk_update_status(&ids, status).await?;
        info!(updated, status = %status, "Bulk match status update");
        let _ = self.event_bus.send(NotificationEvent::MatchStatusChanged {
            ids,
            status: status.as_str().to_string(),
        });
        Ok(updated)
    }

    // ========================================================================
    // Hero slides
    // ========================================================================

    /// Active slides in order, with movie and series slides filled in from
    /// the title they reference.
    pub async fn active_slides(&self) -> Result<Vec<HeroSlide>, CatalogError> {
        let slides = self.store.hero_slides().list(true).await?;
        let movies = self.store.movies();
        let series = self.store.series();

        let mut enriched = Vec::with_capacity(slides.len());
        for slide in slides {
            let slide = match (slide.content_type, slide.content_id.clone()) {
                (SlideContentType::Movie, Some(slug)) => match movies.get_by_slug(&slug).await? {
                    Some(movie) => enrich_slide(slide, SlideSource::movie(&movie)),
                    None => slide,
                },
                (SlideContentType::Series, Some(slug)) => match series.get_by_slug(&slug).await? {
                    Some(show) => enrich_slide(slide, SlideSource::series(&show)),
                    None => slide,
                },
                _ => slide,
            };
            enriched.push(slide);
        }

        enriched.sort_by_key(|s| s.order);
        Ok(enriched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Embed;

    fn sample_match(id: i32, status: MatchStatus, kickoff_at: i64, is_premium: bool) -> Match {
        Match {
            id,
            slug: format!("m-{id}"),
            title: format!("Match {id}"),
            team_a: "A".into(),
            team_b: "B".into(),
            team_a_logo: None,
            team_b_logo: None,
            league_id: None,
            league_name: None,
            kickoff_at,
            status,
            is_premium,
            required_plan: None,
            embeds: Vec::<Embed>::new(),
            thumbnail_url: None,
            summary: None,
            score_a: None,
            score_b: None,
            minute: None,
            views: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn sample_episode(id: i32, season_number: i32, episode_number: i32) -> Episode {
        Episode {
            id,
            series_id: 1,
            season_number,
            episode_number,
            title: format!("Episode {id}"),
            title_somali: None,
            overview: None,
            still_url: None,
            air_date: None,
            runtime: None,
            embeds: Vec::new(),
            is_published: true,
            created_at: 0,
        }
    }

    #[test]
    fn test_group_seasons() {
        let seasons = group_seasons(vec![
            sample_episode(1, 1, 1),
            sample_episode(2, 1, 2),
            sample_episode(3, 2, 1),
        ]);
        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[0].season_number, 1);
        assert_eq!(seasons[0].episodes.len(), 2);
        assert_eq!(seasons[1].episodes[0].id, 3);
        assert!(group_seasons(Vec::new()).is_empty());
    }

    #[test]
    fn test_seo_defaults() {
        assert_eq!(
            default_seo_title("Pathaan", true),
            "Daawo Pathaan Af-Somali Online | Fanbroj"
        );
        assert_eq!(default_seo_title("Dune", false), "Daawo Dune Online | Fanbroj");

        let overview = "x".repeat(300);
        let description = default_seo_description(&overview);
        assert_eq!(description.chars().count(), 158);
        assert!(description.ends_with("..."));
        assert_eq!(default_seo_description("Short"), "Short...");
    }

    #[test]
    fn test_group_matches() {
        let mut all = vec![
            sample_match(1, MatchStatus::Upcoming, 300, true),
            sample_match(2, MatchStatus::Live, 100, false),
            sample_match(3, MatchStatus::Upcoming, 200, false),
        ];
        for i in 0..12 {
            all.push(sample_match(10 + i, MatchStatus::Finished, i64::from(i), true));
        }

        let grouped = group_matches(all);
        assert_eq!(grouped.live.len(), 1);
        assert_eq!(
            grouped.upcoming.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![3, 1]
        );
        assert_eq!(grouped.finished.len(), FINISHED_MATCHES_SHOWN);
        assert_eq!(grouped.finished[0].id, 21);
        assert_eq!(grouped.premium.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1]);
    }
}
