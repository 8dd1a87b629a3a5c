mod course;
mod login;
mod urls;

pub(crate) use course::CourseApi;
pub(crate) use login::AuthApi;
pub(crate) use urls::ApiUrls;
