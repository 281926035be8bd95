//! The dashboard service: cached, session-scoped access to Moodle data
//!
//! A [`Dashboard`] owns the configuration, the HTTP client, the cache and
//! the token store. It is built once by the composition root and shared by
//! every request handler.

use crate::api::token::{MemoryTokens, TokenCodec};
use crate::cache::{spawn_sweeper, Cache, CacheKey, Cached, Expiring};
use crate::config::Config;
use crate::extract::{
    extract_assignment_info, extract_attendance, extract_course_content, extract_quiz_info,
    extract_user_profile,
};
use crate::fetch::MoodleClient;
use crate::models::{
    merge_courses, ActivityKind, AiLevel, AssignmentInfo, AttendanceRecord, AttendanceSummary,
    Course, CourseContent, QuizInfo, SyllabusInfo, UserProfile,
};
use crate::session::{resume_session, SessionCredential};
use crate::{DashboardError, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Course header data shown next to a syllabus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInfo {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance: Option<AttendanceSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_level: Option<AiLevel>,
}

impl From<&CourseContent> for CourseInfo {
    fn from(content: &CourseContent) -> Self {
        Self {
            id: content.course_id.clone(),
            name: content.course_name.clone(),
            attendance: content.attendance_summary,
            ai_level: content.ai_level.clone(),
        }
    }
}

/// A course's syllabus together with its header data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSyllabus {
    pub course_info: CourseInfo,
    pub syllabus: SyllabusInfo,
}

/// One activity whose detail page could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailFailure {
    pub module_id: String,
    pub error: String,
}

/// Course content with quiz and assignment details attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseDetails {
    pub content: CourseContent,

    /// Activities left without details; the rest are still filled in
    pub failures: Vec<DetailFailure>,
}

enum ActivityDetail {
    Quiz(QuizInfo),
    Assignment(AssignmentInfo),
}

/// Session-scoped access to Moodle data with caching
pub struct Dashboard<C: TokenCodec = MemoryTokens> {
    config: Config,
    client: MoodleClient,
    cache: Arc<Cache>,
    tokens: Arc<C>,
}

impl Dashboard<MemoryTokens> {
    /// Builds a dashboard with an in-memory cache and token store
    pub fn new(config: Config) -> Result<Self> {
        let client = MoodleClient::new(&config.moodle, &config.http)?;
        let tokens = MemoryTokens::with_ttl(config.cache.token_ttl);
        Ok(Self::with_parts(config, client, Arc::new(Cache::new()), tokens))
    }
}

impl<C: TokenCodec> Dashboard<C> {
    pub fn with_parts(config: Config, client: MoodleClient, cache: Arc<Cache>, tokens: C) -> Self {
        Self {
            config,
            client,
            cache,
            tokens: Arc::new(tokens),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &MoodleClient {
        &self.client
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    pub fn tokens(&self) -> &C {
        &self.tokens
    }

    /// Purges expired cache entries and tokens right away
    pub fn sweep(&self) -> (usize, usize)
    where
        C: Expiring,
    {
        (self.cache.purge_expired(), self.tokens.purge_expired())
    }

    /// Starts purging expired cache entries and tokens every
    /// `sweep-interval` seconds. The tasks end once the dashboard is dropped.
    pub fn start_sweeper(&self) -> [JoinHandle<()>; 2]
    where
        C: Expiring,
    {
        let every = Duration::from_secs(self.config.cache.sweep_interval);
        tracing::info!("Sweeping the cache and tokens every {}s", every.as_secs());
        [
            spawn_sweeper(&self.cache, every),
            spawn_sweeper(&self.tokens, every),
        ]
    }

    fn detail_limit(&self) -> usize {
        self.config.http.max_concurrent_details.max(1)
    }

    /// Configured lifetime of `key`'s entity
    pub(crate) fn ttl(&self, key: &CacheKey) -> u64 {
        key.ttl_class().seconds(&self.config.cache)
    }

    /// Checks a raw session cookie, caching the resulting credential
    pub async fn validate_session(&self, session_token: &str) -> Result<Cached<SessionCredential>> {
        let probe = SessionCredential::new(session_token, None);
        let key = CacheKey::session_validation(&probe);
        self.cache
            .with_cache(&key, self.ttl(&key), || async {
                resume_session(&self.client, session_token)
                    .await
                    .map_err(DashboardError::from)
            })
            .await
    }

    pub async fn fetch_profile(&self, credential: &SessionCredential) -> Result<Cached<UserProfile>> {
        let key = CacheKey::profile(credential);
        self.cache
            .with_cache(&key, self.ttl(&key), || self.load_profile(credential))
            .await
    }

    async fn load_profile(&self, credential: &SessionCredential) -> Result<UserProfile> {
        let page = self.client.profile_page(credential).await?;
        extract_user_profile(&page).ok_or(DashboardError::ExtractionIncomplete {
            entity: "user profile",
        })
    }

    pub async fn fetch_courses(&self, credential: &SessionCredential) -> Result<Cached<Vec<Course>>> {
        let key = CacheKey::courses(credential);
        self.cache
            .with_cache(&key, self.ttl(&key), || async {
                self.client
                    .enrolled_courses(credential)
                    .await
                    .map_err(DashboardError::from)
            })
            .await
    }

    pub async fn fetch_attendance(
        &self,
        credential: &SessionCredential,
        course_id: &str,
    ) -> Result<Cached<Vec<AttendanceRecord>>> {
        let key = CacheKey::attendance(credential, course_id);
        self.cache
            .with_cache(&key, self.ttl(&key), || self.load_attendance(credential, course_id))
            .await
    }

    async fn load_attendance(
        &self,
        credential: &SessionCredential,
        course_id: &str,
    ) -> Result<Vec<AttendanceRecord>> {
        let page = self.client.attendance_page(credential, course_id).await?;
        Ok(extract_attendance(&page))
    }

    pub async fn fetch_course_content(
        &self,
        credential: &SessionCredential,
        course_id: &str,
    ) -> Result<Cached<CourseContent>> {
        let key = CacheKey::course_content(credential, course_id);
        self.cache
            .with_cache(&key, self.ttl(&key), || self.load_course_content(credential, course_id))
            .await
    }

    async fn load_course_content(
        &self,
        credential: &SessionCredential,
        course_id: &str,
    ) -> Result<CourseContent> {
        let page = self.client.course_page(credential, course_id).await?;
        extract_course_content(&page).ok_or(DashboardError::ExtractionIncomplete {
            entity: "course content",
        })
    }

    /// The syllabus of the course's "Course Syllabus" section.
    ///
    /// A course without that section yields [`SyllabusInfo::None`], not an
    /// error.
    pub async fn fetch_syllabus(
        &self,
        credential: &SessionCredential,
        course_id: &str,
    ) -> Result<Cached<CourseSyllabus>> {
        let key = CacheKey::syllabus(credential, course_id);
        self.cache
            .with_cache(&key, self.ttl(&key), || self.load_syllabus(credential, course_id))
            .await
    }

    async fn load_syllabus(
        &self,
        credential: &SessionCredential,
        course_id: &str,
    ) -> Result<CourseSyllabus> {
        let content = self.load_course_content(credential, course_id).await?;
        Ok(CourseSyllabus {
            course_info: CourseInfo::from(&content),
            syllabus: content.syllabus().cloned().unwrap_or(SyllabusInfo::None),
        })
    }

    pub async fn fetch_quiz(
        &self,
        credential: &SessionCredential,
        module_id: &str,
    ) -> Result<Cached<QuizInfo>> {
        let key = CacheKey::quiz(credential, module_id);
        self.cache
            .with_cache(&key, self.ttl(&key), || self.load_quiz(credential, module_id))
            .await
    }

    async fn load_quiz(&self, credential: &SessionCredential, module_id: &str) -> Result<QuizInfo> {
        let page = self.client.quiz_page(credential, module_id).await?;
        extract_quiz_info(&page, module_id).ok_or(DashboardError::ExtractionIncomplete { entity: "quiz" })
    }

    pub async fn fetch_assignment(
        &self,
        credential: &SessionCredential,
        module_id: &str,
    ) -> Result<Cached<AssignmentInfo>> {
        let key = CacheKey::assignment(credential, module_id);
        self.cache
            .with_cache(&key, self.ttl(&key), || self.load_assignment(credential, module_id))
            .await
    }

    async fn load_assignment(
        &self,
        credential: &SessionCredential,
        module_id: &str,
    ) -> Result<AssignmentInfo> {
        let page = self.client.assignment_page(credential, module_id).await?;
        extract_assignment_info(&page, module_id)
            .ok_or(DashboardError::ExtractionIncomplete { entity: "assignment" })
    }

    /// Loads a course and the details of every quiz and assignment in it.
    ///
    /// Detail pages are fetched concurrently, at most
    /// `max-concurrent-details` at a time. A failing detail fetch is logged
    /// and reported in [`CourseDetails::failures`]; it never fails the call.
    ///
    /// # Returns
    ///
    /// * `Ok(CourseDetails)` - Content with every loadable detail attached
    /// * `Err(DashboardError)` - The course page itself could not be loaded
    pub async fn fetch_course_details(
        &self,
        credential: &SessionCredential,
        course_id: &str,
    ) -> Result<CourseDetails> {
        let mut content = self.fetch_course_content(credential, course_id).await?.value;

        let mut seen = HashSet::new();
        let jobs: Vec<(String, ActivityKind)> = content
            .activities()
            .filter(|a| a.kind.has_detail() && seen.insert(a.module_id.clone()))
            .map(|a| (a.module_id.clone(), a.kind))
            .collect();
        tracing::debug!("Loading {} activity details for course {}", jobs.len(), course_id);

        let results: Vec<(String, Result<ActivityDetail>)> = stream::iter(jobs)
            .map(|(module_id, kind)| async move {
                let detail = match kind {
                    ActivityKind::Quiz => self
                        .fetch_quiz(credential, &module_id)
                        .await
                        .map(|c| ActivityDetail::Quiz(c.value)),
                    _ => self
                        .fetch_assignment(credential, &module_id)
                        .await
                        .map(|c| ActivityDetail::Assignment(c.value)),
                };
                (module_id, detail)
            })
            .buffer_unordered(self.detail_limit())
            .collect()
            .await;

        let mut details = HashMap::new();
        let mut failures = Vec::new();
        for (module_id, result) in results {
            match result {
                Ok(detail) => {
                    details.insert(module_id, detail);
                }
                Err(e) => {
                    tracing::warn!("Detail fetch for module {} failed: {}", module_id, e);
                    failures.push(DetailFailure {
                        module_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        failures.sort_by(|a, b| a.module_id.cmp(&b.module_id));

        for section in &mut content.sections {
            section.activities = std::mem::take(&mut section.activities)
                .into_iter()
                .map(|activity| match details.get(&activity.module_id) {
                    Some(ActivityDetail::Quiz(quiz)) => activity.with_quiz(quiz.clone()),
                    Some(ActivityDetail::Assignment(a)) => activity.with_assignment(a.clone()),
                    None => activity,
                })
                .collect();
        }

        Ok(CourseDetails { content, failures })
    }

    /// Refreshes the course list and every course's attendance.
    ///
    /// Attendance is fetched concurrently per course. A course whose
    /// attendance cannot be loaded keeps what `previous` had for it.
    pub async fn refresh_courses(
        &self,
        credential: &SessionCredential,
        previous: &[Course],
    ) -> Result<Vec<Course>> {
        let courses = self.fetch_courses(credential).await?.value;
        tracing::info!("Syncing attendance for {} courses", courses.len());

        let fresh: Vec<Course> = stream::iter(courses)
            .map(|mut course| async move {
                let course_id = course.id.to_string();
                match self.fetch_attendance(credential, &course_id).await {
                    Ok(cached) => course.attendance = Some(cached.value),
                    Err(e) => tracing::warn!("Attendance for course {} failed: {}", course_id, e),
                }
                course
            })
            .buffered(self.detail_limit())
            .collect()
            .await;

        Ok(merge_courses(previous, fresh))
    }
}
