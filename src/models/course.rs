use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub projected_hours: Option<f64>,
    pub total_lectures: Option<i64>,
    pub price: f64,
    pub payment_type: String,
    pub monthly_payment_month: Option<String>,
    pub is_free: bool,
    pub launch_date: Option<String>,
    pub is_published: bool,
    pub created_at: String,
}

/// Catalogue entry shown to everyone, signed in or not.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub projected_hours: Option<f64>,
    pub price: f64,
    pub payment_type: String,
    pub is_free: bool,
    pub teacher_name: String,
    pub lecture_count: i64,
    pub assignment_count: i64,
    pub quiz_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseTitle {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCourseRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub projected_hours: Option<f64>,
    pub launch_date: Option<String>,
    pub is_published: Option<bool>,
    pub price: Option<f64>,
    pub payment_type: Option<String>,
    pub monthly_payment_month: Option<String>,
    pub is_free: Option<bool>,
    /// Honoured for admins only; teachers always own what they create.
    pub teacher_id: Option<i64>,
}

/// Partial update. Nullable columns distinguish "absent" (`None`) from an
/// explicit `null` (`Some(None)`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub projected_hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub total_lectures: Option<Option<i64>>,
    pub price: Option<f64>,
    pub payment_type: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub monthly_payment_month: Option<Option<String>>,
    pub is_free: Option<bool>,
}

impl UpdateCourseRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.projected_hours.is_none()
            && self.total_lectures.is_none()
            && self.price.is_none()
            && self.payment_type.is_none()
            && self.monthly_payment_month.is_none()
            && self.is_free.is_none()
    }

    pub fn apply(self, course: &mut Course) {
        if let Some(title) = self.title {
            course.title = title;
        }
        if let Some(description) = self.description {
            course.description = description;
        }
        if let Some(hours) = self.projected_hours {
            course.projected_hours = hours;
        }
        if let Some(total) = self.total_lectures {
            course.total_lectures = total;
        }
        if let Some(price) = self.price {
            course.price = price;
        }
        if let Some(payment_type) = self.payment_type {
            course.payment_type = payment_type;
        }
        if let Some(month) = self.monthly_payment_month {
            course.monthly_payment_month = month;
        }
        if let Some(is_free) = self.is_free {
            course.is_free = is_free;
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollRequest {
    pub course_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_null_differs_from_missing() {
        let req: UpdateCourseRequest =
            serde_json::from_str(r#"{"projected_hours": null}"#).unwrap();
        assert_eq!(req.projected_hours, Some(None));
        assert!(req.total_lectures.is_none());
        assert!(!req.is_empty());

        let empty: UpdateCourseRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
