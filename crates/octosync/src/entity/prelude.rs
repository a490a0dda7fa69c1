//! Common re-exports for convenient entity usage.

pub use super::contributor::{
    ActiveModel as ContributorActiveModel, Column as ContributorColumn, Entity as Contributor,
    Model as ContributorModel,
};
pub use super::cursor::{
    ActiveModel as CursorActiveModel, Column as CursorColumn, Entity as Cursor,
    Model as CursorModel,
};
pub use super::group_organization::{
    ActiveModel as GroupOrganizationActiveModel, Column as GroupOrganizationColumn,
    Entity as GroupOrganization, Model as GroupOrganizationModel,
};
pub use super::group_repository::{
    ActiveModel as GroupRepositoryActiveModel, Column as GroupRepositoryColumn,
    Entity as GroupRepository, Model as GroupRepositoryModel,
};
pub use super::issue::{
    ActiveModel as IssueActiveModel, Column as IssueColumn, Entity as Issue, Model as IssueModel,
};
pub use super::issue_assignee::{
    ActiveModel as IssueAssigneeActiveModel, Column as IssueAssigneeColumn,
    Entity as IssueAssignee, Model as IssueAssigneeModel,
};
pub use super::issue_state::IssueState;
pub use super::organization::{
    ActiveModel as OrganizationActiveModel, Column as OrganizationColumn, Entity as Organization,
    Model as OrganizationModel,
};
pub use super::pull_request::{
    ActiveModel as PullRequestActiveModel, Column as PullRequestColumn, Entity as PullRequest,
    Model as PullRequestModel,
};
pub use super::pull_request_assignee::{
    ActiveModel as PullRequestAssigneeActiveModel, Column as PullRequestAssigneeColumn,
    Entity as PullRequestAssignee, Model as PullRequestAssigneeModel,
};
pub use super::pull_request_state::PullRequestState;
pub use super::repository::{
    ActiveModel as RepositoryActiveModel, Column as RepositoryColumn, Entity as Repository,
    Model as RepositoryModel,
};
pub use super::sync_group::{
    ActiveModel as SyncGroupActiveModel, Column as SyncGroupColumn, Entity as SyncGroup,
    Model as SyncGroupModel,
};
