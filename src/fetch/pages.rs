//! Page-level requests, one per Moodle page the dashboard reads

use crate::fetch::MoodleClient;
use crate::session::SessionCredential;
use crate::FetchError;

pub const PROFILE_PATH: &str = "/user/profile.php";
pub const ATTENDANCE_PATH: &str = "/course/attendance.php";
pub const COURSE_VIEW_PATH: &str = "/course/view.php";
pub const QUIZ_PATH: &str = "/mod/quiz/view.php";
pub const ASSIGNMENT_PATH: &str = "/mod/assign/view.php";

impl MoodleClient {
    pub async fn profile_page(&self, credential: &SessionCredential) -> Result<String, FetchError> {
        self.get_page(credential, PROFILE_PATH).await
    }

    pub async fn attendance_page(
        &self,
        credential: &SessionCredential,
        course_id: &str,
    ) -> Result<String, FetchError> {
        let url = self.url_with_id(ATTENDANCE_PATH, course_id)?;
        self.get(credential, url).await
    }

    pub async fn course_page(
        &self,
        credential: &SessionCredential,
        course_id: &str,
    ) -> Result<String, FetchError> {
        let url = self.url_with_id(COURSE_VIEW_PATH, course_id)?;
        self.get(credential, url).await
    }

    pub async fn quiz_page(
        &self,
        credential: &SessionCredential,
        module_id: &str,
    ) -> Result<String, FetchError> {
        let url = self.url_with_id(QUIZ_PATH, module_id)?;
        self.get(credential, url).await
    }

    pub async fn assignment_page(
        &self,
        credential: &SessionCredential,
        module_id: &str,
    ) -> Result<String, FetchError> {
        let url = self.url_with_id(ASSIGNMENT_PATH, module_id)?;
        self.get(credential, url).await
    }
}
