//! Schema model: entity kinds, their tables and the foreign keys between them.

use std::fmt;

/// Primary key type shared by every table.
pub type EntityKey = i32;

/// One logical table of the project board schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Team,
    Project,
    User,
    ProjectTeam,
    Task,
    Attachment,
    Comment,
    TaskAssignment,
}

/// A foreign key from one entity kind to the primary key of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    /// Kind that owns the foreign key column.
    pub owner: EntityKind,
    /// Relation name, as used in logs and errors.
    pub name: &'static str,
    /// Foreign key column on the owner's table.
    pub column: &'static str,
    /// Kind the key points at.
    pub target: EntityKind,
    /// Whether the owner row may leave this relation unset.
    pub optional: bool,
}

const fn relation(
    owner: EntityKind,
    name: &'static str,
    column: &'static str,
    target: EntityKind,
    optional: bool,
) -> Relation {
    Relation {
        owner,
        name,
        column,
        target,
        optional,
    }
}

/// Relation constants, grouped by owning kind.
pub mod relations {
    use super::{EntityKind::*, Relation, relation};

    pub const USER_TEAM: Relation = relation(User, "team", "team_id", Team, true);

    pub const PROJECT_TEAM_TEAM: Relation = relation(ProjectTeam, "team", "team_id", Team, false);
    pub const PROJECT_TEAM_PROJECT: Relation =
        relation(ProjectTeam, "project", "project_id", Project, false);

    pub const TASK_PROJECT: Relation = relation(Task, "project", "project_id", Project, false);
    pub const TASK_AUTHOR: Relation = relation(Task, "author", "author_user_id", User, false);
    pub const TASK_ASSIGNEE: Relation = relation(Task, "assignee", "assigned_user_id", User, true);

    pub const ATTACHMENT_TASK: Relation = relation(Attachment, "task", "task_id", Task, false);
    pub const ATTACHMENT_UPLOADED_BY: Relation =
        relation(Attachment, "uploaded_by", "uploaded_by_id", User, false);

    pub const COMMENT_TASK: Relation = relation(Comment, "task", "task_id", Task, false);
    pub const COMMENT_USER: Relation = relation(Comment, "user", "user_id", User, false);

    pub const TASK_ASSIGNMENT_USER: Relation =
        relation(TaskAssignment, "user", "user_id", User, false);
    pub const TASK_ASSIGNMENT_TASK: Relation =
        relation(TaskAssignment, "task", "task_id", Task, false);
}

impl EntityKind {
    /// Forward dependency order: a kind only references kinds listed before it.
    pub const ORDER: [EntityKind; 8] = [
        EntityKind::Team,
        EntityKind::Project,
        EntityKind::User,
        EntityKind::ProjectTeam,
        EntityKind::Task,
        EntityKind::Attachment,
        EntityKind::Comment,
        EntityKind::TaskAssignment,
    ];

    /// Kinds in reverse dependency order (children before parents), the only
    /// order in which every table can be emptied without violating a foreign key.
    pub fn reverse_order() -> impl Iterator<Item = EntityKind> {
        Self::ORDER.into_iter().rev()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Team => "Team",
            EntityKind::Project => "Project",
            EntityKind::User => "User",
            EntityKind::ProjectTeam => "ProjectTeam",
            EntityKind::Task => "Task",
            EntityKind::Attachment => "Attachment",
            EntityKind::Comment => "Comment",
            EntityKind::TaskAssignment => "TaskAssignment",
        }
    }

    /// Returns the database table name.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Team => "teams",
            EntityKind::Project => "projects",
            EntityKind::User => "users",
            EntityKind::ProjectTeam => "project_teams",
            EntityKind::Task => "tasks",
            EntityKind::Attachment => "attachments",
            EntityKind::Comment => "comments",
            EntityKind::TaskAssignment => "task_assignments",
        }
    }

    /// Returns the primary key column.
    pub fn primary_key(&self) -> &'static str {
        match self {
            EntityKind::User => "user_id",
            _ => "id",
        }
    }

    /// Foreign keys owned by this kind.
    pub fn relations(&self) -> &'static [Relation] {
        use relations::*;

        match self {
            EntityKind::Team | EntityKind::Project => &[],
            EntityKind::User => &[USER_TEAM],
            EntityKind::ProjectTeam => &[PROJECT_TEAM_TEAM, PROJECT_TEAM_PROJECT],
            EntityKind::Task => &[TASK_PROJECT, TASK_AUTHOR, TASK_ASSIGNEE],
            EntityKind::Attachment => &[ATTACHMENT_TASK, ATTACHMENT_UPLOADED_BY],
            EntityKind::Comment => &[COMMENT_TASK, COMMENT_USER],
            EntityKind::TaskAssignment => &[TASK_ASSIGNMENT_USER, TASK_ASSIGNMENT_TASK],
        }
    }

    /// Relations on other kinds that point at this kind.
    pub fn dependents(&self) -> impl Iterator<Item = Relation> + '_ {
        Self::ORDER
            .iter()
            .flat_map(|kind| kind.relations().iter().copied())
            .filter(move |relation| relation.target == *self)
    }

    /// Position in [`EntityKind::ORDER`].
    pub fn level(&self) -> usize {
        Self::ORDER
            .iter()
            .position(|kind| kind == self)
            .unwrap_or(Self::ORDER.len())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
