//! Identity detection against a simulated page
//!
//! The page is rebuilt from what the URL and flags tell us: the repository
//! marker for GitHub, the project path attribute and `data-page` for GitLab.

use sspcloud_core::ProjectIdentity;
use sspcloud_page::identity::GITLAB_PROJECT_PATH_ATTR;
use sspcloud_page::memory::MemoryDom;
use sspcloud_page::{ElementSpec, PageForge};

#[derive(Debug, Clone, Default)]
pub struct PageHints {
    pub project_path: Option<String>,
    pub data_page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub identity: Option<ProjectIdentity>,
    pub eligible: bool,
}

pub fn simulated_page(page_url: &str, forge: PageForge, hints: &PageHints) -> MemoryDom {
    let mut dom = MemoryDom::new(page_url);
    let body = dom.body_node();
    match forge {
        PageForge::Github => {
            dom.append(body, ElementSpec::new("div").id("repository-container-header"));
        }
        PageForge::Gitlab => {
            if let Some(page) = &hints.data_page {
                dom.set_attribute(body, "data-page", page);
            }
            if let Some(path) = &hints.project_path {
                dom.append(body, ElementSpec::new("div").attr(GITLAB_PROJECT_PATH_ATTR, path));
            }
        }
    }
    dom
}

pub fn detect(page_url: &str, forge: PageForge, hints: &PageHints) -> Detection {
    let dom = simulated_page(page_url, forge, hints);
    Detection {
        identity: forge.identity(&dom),
        eligible: forge.is_eligible(&dom),
    }
}
