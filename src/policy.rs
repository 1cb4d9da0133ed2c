//! Access rules, one per operation.
//!
//! A [`Policy`] pairs the roles allowed to attempt an operation with the
//! course relationship the caller must hold: teachers may be required to own
//! the course, students may be required to be enrolled in it. Admins pass every
//! course-scoped check once their role is allowed.

use sqlx::SqlitePool;

use crate::db::{courses, enrollments};
use crate::error::AppError;
use crate::models::{CurrentUser, Role};

const EVERYONE: &[Role] = &[Role::Student, Role::Teacher, Role::Admin];
const STAFF: &[Role] = &[Role::Teacher, Role::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Role membership is enough.
    Unscoped,
    /// Teachers must own the course.
    Owner,
    /// Students must be enrolled in the course.
    Enrolled,
    /// Teachers must own it and students must be enrolled.
    OwnerOrEnrolled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Granted,
    Enrollment,
}

#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub roles: &'static [Role],
    pub scope: Scope,
}

impl Policy {
    pub const ADMIN: Policy = Policy::new(&[Role::Admin], Scope::Unscoped);
    pub const TEACHER: Policy = Policy::new(&[Role::Teacher], Scope::Unscoped);
    pub const STUDENT: Policy = Policy::new(&[Role::Student], Scope::Unscoped);
    pub const STAFF: Policy = Policy::new(STAFF, Scope::Unscoped);

    /// Create or change course content.
    pub const AUTHOR: Policy = Policy::new(STAFF, Scope::Owner);
    /// Reordering is reserved to the owning teacher.
    pub const REORDER: Policy = Policy::new(&[Role::Teacher], Scope::Owner);
    /// Read a course outline.
    pub const VIEW_COURSE: Policy = Policy::new(EVERYONE, Scope::Enrolled);
    /// Read lecture material and grand content details.
    pub const VIEW_CONTENT: Policy = Policy::new(EVERYONE, Scope::OwnerOrEnrolled);
    /// Record progress or submit work.
    pub const LEARN: Policy = Policy::new(&[Role::Student], Scope::Enrolled);

    pub const fn new(roles: &'static [Role], scope: Scope) -> Self {
        Self { roles, scope }
    }

    pub fn check_role(&self, viewer: &CurrentUser) -> Result<(), AppError> {
        if self.roles.contains(&viewer.role) {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }

    /// Everything decidable without touching the store.
    pub fn requirement(&self, viewer: &CurrentUser, owner_id: i64) -> Result<Requirement, AppError> {
        self.check_role(viewer)?;

        match (viewer.role, self.scope) {
            (Role::Teacher, Scope::Owner | Scope::OwnerOrEnrolled) if viewer.id != owner_id => {
                Err(AppError::forbidden())
            }
            (Role::Student, Scope::Enrolled | Scope::OwnerOrEnrolled) => Ok(Requirement::Enrollment),
            _ => Ok(Requirement::Granted),
        }
    }

    /// Checks the policy against a course whose owner is already known.
    pub async fn check_course(
        &self,
        db: &SqlitePool,
        viewer: &CurrentUser,
        course_id: i64,
        owner_id: i64,
    ) -> Result<(), AppError> {
        match self.requirement(viewer, owner_id)? {
            Requirement::Granted => Ok(()),
            Requirement::Enrollment => {
                if enrollments::is_enrolled(db, viewer.id, course_id).await? {
                    Ok(())
                } else {
                    Err(AppError::Forbidden("Not enrolled in this course".to_string()))
                }
            }
        }
    }

    /// Looks the course up first: a missing course is `NotFound`.
    pub async fn authorize(
        &self,
        db: &SqlitePool,
        viewer: &CurrentUser,
        course_id: i64,
    ) -> Result<(), AppError> {
        self.check_role(viewer)?;
        let owner_id = courses::find_owner(db, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;
        self.check_course(db, viewer, course_id, owner_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: Role) -> CurrentUser {
        CurrentUser {
            id,
            name: "u".to_string(),
            email: format!("u{id}@example.com"),
            role,
        }
    }

    #[test]
    fn teachers_must_own_for_authoring() {
        let owner = user(1, Role::Teacher);
        let other = user(2, Role::Teacher);
        assert_eq!(Policy::AUTHOR.requirement(&owner, 1).unwrap(), Requirement::Granted);
        assert!(matches!(
            Policy::AUTHOR.requirement(&other, 1),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn admins_author_any_course_but_cannot_reorder() {
        let admin = user(9, Role::Admin);
        assert_eq!(Policy::AUTHOR.requirement(&admin, 1).unwrap(), Requirement::Granted);
        assert!(Policy::REORDER.requirement(&admin, 1).is_err());
    }

    #[test]
    fn students_need_enrollment_to_read() {
        let student = user(3, Role::Student);
        assert_eq!(
            Policy::VIEW_COURSE.requirement(&student, 1).unwrap(),
            Requirement::Enrollment
        );
        assert_eq!(
            Policy::VIEW_CONTENT.requirement(&student, 1).unwrap(),
            Requirement::Enrollment
        );
        assert!(Policy::AUTHOR.requirement(&student, 3).is_err());
    }

    #[test]
    fn any_teacher_may_view_an_outline_but_not_lecture_material() {
        let other = user(2, Role::Teacher);
        assert_eq!(Policy::VIEW_COURSE.requirement(&other, 1).unwrap(), Requirement::Granted);
        assert!(Policy::VIEW_CONTENT.requirement(&other, 1).is_err());
    }
}
