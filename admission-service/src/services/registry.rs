//! Branch/course/user reference data.
//!
//! Branches and courses are plain CRUD with soft-delete; users are owned by
//! the identity service and only read here for reference validation.

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use crate::models::{Branch, Course, User};

#[derive(Clone)]
pub struct RegistryRepository {
    branches: Collection<Branch>,
    courses: Collection<Course>,
    users: Collection<User>,
}

impl RegistryRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            branches: db.collection("branches"),
            courses: db.collection("courses"),
            users: db.collection("users"),
        }
    }

    pub async fn init_indexes(&self) -> Result<()> {
        let unique_code = |name: &str| {
            IndexOptions::builder()
                .unique(true)
                .name(name.to_string())
                .build()
        };

        self.branches
            .create_indexes(
                [IndexModel::builder()
                    .keys(doc! { "code": 1 })
                    .options(unique_code("branch_code_idx"))
                    .build()],
                None,
            )
            .await?;
        self.courses
            .create_indexes(
                [IndexModel::builder()
                    .keys(doc! { "code": 1 })
                    .options(unique_code("course_code_idx"))
                    .build()],
                None,
            )
            .await?;
        Ok(())
    }

    // --- users ---

    pub async fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.find_one(doc! { "_id": id }, None).await?)
    }

    // --- branches ---

    pub async fn create_branch(&self, branch: &Branch) -> Result<()> {
        self.branches.insert_one(branch, None).await?;
        Ok(())
    }

    pub async fn find_branch(&self, id: &str) -> Result<Option<Branch>> {
        Ok(self.branches.find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn find_active_branch(&self, id: &str) -> Result<Option<Branch>> {
        Ok(self
            .branches
            .find_one(doc! { "_id": id, "is_active": true }, None)
            .await?)
    }

    pub async fn list_branches(&self) -> Result<Vec<Branch>> {
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        let cursor = self.branches.find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn update_branch(&self, id: &str, set: Document) -> Result<Option<Branch>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .branches
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await?)
    }

    /// Soft delete: the branch stays addressable but inactive.
    pub async fn deactivate_branch(&self, id: &str) -> Result<bool> {
        let result = self
            .branches
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "is_active": false,
                    "updated_at": mongodb::bson::DateTime::now(),
                }},
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    // --- courses ---

    pub async fn create_course(&self, course: &Course) -> Result<()> {
        self.courses.insert_one(course, None).await?;
        Ok(())
    }

    pub async fn find_course(&self, id: &str) -> Result<Option<Course>> {
        Ok(self.courses.find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn find_active_course(&self, id: &str) -> Result<Option<Course>> {
        Ok(self
            .courses
            .find_one(doc! { "_id": id, "is_active": true }, None)
            .await?)
    }

    pub async fn list_courses(&self, branch_id: Option<&str>) -> Result<Vec<Course>> {
        let mut filter = doc! {};
        if let Some(branch_id) = branch_id {
            filter.insert("branch_ids", branch_id);
        }
        let options = FindOptions::builder().sort(doc! { "title": 1 }).build();
        let cursor = self.courses.find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn update_course(&self, id: &str, set: Document) -> Result<Option<Course>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .courses
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await?)
    }

    pub async fn deactivate_course(&self, id: &str) -> Result<bool> {
        let result = self
            .courses
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "is_active": false,
                    "updated_at": mongodb::bson::DateTime::now(),
                }},
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }
}
