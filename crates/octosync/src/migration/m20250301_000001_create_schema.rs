//! Initial migration to create the mirror schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_organizations(manager).await?;
        self.create_repositories(manager).await?;
        self.create_issues(manager).await?;
        self.create_pull_requests(manager).await?;
        self.create_issue_assignees(manager).await?;
        self.create_pull_request_assignees(manager).await?;
        self.create_contributors(manager).await?;
        self.create_cursors(manager).await?;
        self.create_groups(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            GroupOrganizations::Table.into_iden(),
            GroupRepositories::Table.into_iden(),
            SyncGroups::Table.into_iden(),
            Cursors::Table.into_iden(),
            Contributors::Table.into_iden(),
            PullRequestAssignees::Table.into_iden(),
            IssueAssignees::Table.into_iden(),
            PullRequests::Table.into_iden(),
            Issues::Table.into_iden(),
            Repositories::Table.into_iden(),
            Organizations::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

impl Migration {
    async fn create_organizations(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organizations::NodeId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Organizations::Name).string().not_null())
                    .col(
                        ColumnDef::new(Organizations::IssueCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Organizations::PullRequestCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Organizations::StarCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Organizations::ForkCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Organizations::ContributorCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_organizations_name")
                    .table(Organizations::Table)
                    .col(Organizations::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repositories::NodeId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Repositories::Owner).string().not_null())
                    .col(ColumnDef::new(Repositories::Name).string().not_null())
                    .col(ColumnDef::new(Repositories::OwnerNodeId).string().null())
                    .to_owned(),
            )
            .await?;

        // Natural identity key.
        manager
            .create_index(
                Index::create()
                    .name("idx_repositories_owner_name")
                    .table(Repositories::Table)
                    .col(Repositories::Owner)
                    .col(Repositories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_repositories_owner_node_id")
                    .table(Repositories::Table)
                    .col(Repositories::OwnerNodeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_issues(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Issues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Issues::NodeId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Issues::RepoNodeId).string().not_null())
                    .col(ColumnDef::new(Issues::Number).integer().not_null())
                    .col(ColumnDef::new(Issues::Url).text().not_null())
                    .col(ColumnDef::new(Issues::State).string().not_null())
                    .col(
                        ColumnDef::new(Issues::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issues_repo_node_id")
                    .table(Issues::Table)
                    .col(Issues::RepoNodeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_pull_requests(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PullRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequests::NodeId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PullRequests::RepoNodeId).string().not_null())
                    .col(ColumnDef::new(PullRequests::Number).integer().not_null())
                    .col(ColumnDef::new(PullRequests::Url).text().not_null())
                    .col(ColumnDef::new(PullRequests::State).string().not_null())
                    .col(
                        ColumnDef::new(PullRequests::MergedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pull_requests_repo_node_id")
                    .table(PullRequests::Table)
                    .col(PullRequests::RepoNodeId)
                    .to_owned(),
            )
            .await?;

        // State queries (open PRs per repository).
        manager
            .create_index(
                Index::create()
                    .name("idx_pull_requests_repo_state")
                    .table(PullRequests::Table)
                    .col(PullRequests::RepoNodeId)
                    .col(PullRequests::State)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_issue_assignees(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IssueAssignees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IssueAssignees::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IssueAssignees::IssueNodeId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IssueAssignees::IssueNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IssueAssignees::IssueUrl).text().not_null())
                    .col(ColumnDef::new(IssueAssignees::RepoLabel).string().not_null())
                    .col(
                        ColumnDef::new(IssueAssignees::AssigneeNodeId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IssueAssignees::AssigneeLogin)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issue_assignees_issue")
                    .table(IssueAssignees::Table)
                    .col(IssueAssignees::IssueNodeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issue_assignees_repo_label")
                    .table(IssueAssignees::Table)
                    .col(IssueAssignees::RepoLabel)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_pull_request_assignees(
        &self,
        manager: &SchemaManager<'_>,
    ) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PullRequestAssignees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequestAssignees::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PullRequestAssignees::PullRequestNodeId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestAssignees::PullRequestNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestAssignees::PullRequestUrl)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestAssignees::RepoLabel)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestAssignees::AssigneeNodeId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestAssignees::AssigneeLogin)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pull_request_assignees_pr")
                    .table(PullRequestAssignees::Table)
                    .col(PullRequestAssignees::PullRequestNodeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pull_request_assignees_repo_label")
                    .table(PullRequestAssignees::Table)
                    .col(PullRequestAssignees::RepoLabel)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_contributors(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contributors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Contributors::NodeId).string().not_null())
                    .col(ColumnDef::new(Contributors::RepoNodeId).string().not_null())
                    .col(ColumnDef::new(Contributors::Login).string().not_null())
                    .col(ColumnDef::new(Contributors::Company).string().null())
                    .col(ColumnDef::new(Contributors::Location).string().null())
                    .primary_key(
                        Index::create()
                            .col(Contributors::NodeId)
                            .col(Contributors::RepoNodeId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contributors_repo_node_id")
                    .table(Contributors::Table)
                    .col(Contributors::RepoNodeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_cursors(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cursors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cursors::RepoNodeId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cursors::RepoLabel).string().not_null())
                    .col(
                        ColumnDef::new(Cursors::LastUpdate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Cursors::EndCursor).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cursors_repo_label")
                    .table(Cursors::Table)
                    .col(Cursors::RepoLabel)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_groups(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncGroups::Name)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SyncGroups::IssueCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncGroups::PullRequestCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncGroups::StarCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncGroups::ForkCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncGroups::ContributorCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupRepositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupRepositories::GroupName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupRepositories::RepoNodeId)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(GroupRepositories::GroupName)
                            .col(GroupRepositories::RepoNodeId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupOrganizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupOrganizations::GroupName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupOrganizations::OrgNodeId)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(GroupOrganizations::GroupName)
                            .col(GroupOrganizations::OrgNodeId),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
#[sea_orm(iden = "organizations")]
enum Organizations {
    Table,
    NodeId,
    Name,
    IssueCount,
    PullRequestCount,
    StarCount,
    ForkCount,
    ContributorCount,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "repositories")]
enum Repositories {
    Table,
    NodeId,
    Owner,
    Name,
    OwnerNodeId,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "issues")]
enum Issues {
    Table,
    NodeId,
    RepoNodeId,
    Number,
    Url,
    State,
    ClosedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "pull_requests")]
enum PullRequests {
    Table,
    NodeId,
    RepoNodeId,
    Number,
    Url,
    State,
    MergedAt,
    ClosedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "issue_assignees")]
enum IssueAssignees {
    Table,
    Id,
    IssueNodeId,
    IssueNumber,
    IssueUrl,
    RepoLabel,
    AssigneeNodeId,
    AssigneeLogin,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "pull_request_assignees")]
enum PullRequestAssignees {
    Table,
    Id,
    PullRequestNodeId,
    PullRequestNumber,
    PullRequestUrl,
    RepoLabel,
    AssigneeNodeId,
    AssigneeLogin,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "contributors")]
enum Contributors {
    Table,
    NodeId,
    RepoNodeId,
    Login,
    Company,
    Location,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "cursors")]
enum Cursors {
    Table,
    RepoNodeId,
    RepoLabel,
    LastUpdate,
    EndCursor,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "sync_groups")]
enum SyncGroups {
    Table,
    Name,
    IssueCount,
    PullRequestCount,
    StarCount,
    ForkCount,
    ContributorCount,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "group_repositories")]
enum GroupRepositories {
    Table,
    GroupName,
    RepoNodeId,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "group_organizations")]
enum GroupOrganizations {
    Table,
    GroupName,
    OrgNodeId,
}
