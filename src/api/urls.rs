use crate::core::config::Site;

/// Per-site endpoint roots. The course host serves account and catalogue
/// calls; the api host serves courseware, study records and report sync.
#[derive(Debug, Clone)]
pub(crate) struct ApiUrls {
    pub(crate) course: String,
    pub(crate) api: String,
}

impl ApiUrls {
    pub(crate) fn for_site(site: Site) -> Self {
        match site {
            Site::Ulearning => Self {
                course: "https://courseapi.ulearning.cn".to_string(),
                api: "https://api.ulearning.cn".to_string(),
            },
            Site::Dgut => Self {
                course: "https://lms.dgut.edu.cn/courseapi".to_string(),
                api: "https://ua.dgut.edu.cn/uaapi".to_string(),
            },
        }
    }
}
