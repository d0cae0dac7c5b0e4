use std::sync::Arc;

use crate::application::pagination::ListingPolicy;
use crate::application::repos::HealthRepo;
use crate::application::stories::StoryService;
use crate::application::topics::TopicService;

#[derive(Clone)]
pub struct ApiState {
    pub stories: Arc<StoryService>,
    pub topics: Arc<TopicService>,
    pub health: Arc<dyn HealthRepo>,
    pub story_listing: ListingPolicy,
    pub topic_listing: ListingPolicy,
}
