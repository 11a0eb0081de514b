use crate::api::attendance::{
    AttendanceListResponse, AttendanceListRow, IssueCodeReq, IssuedSession, MarkAttendanceReq,
    Redeemed,
};
use crate::api::classroom::{ClassroomRow, CreateClassroom, UpdateClassroom};
use crate::api::image::CreateImage;
use crate::api::request::{CreateRequest, RequestRow, UpdateRequest};
use crate::api::slide::{CreateSlide, CreateSlideControl};
use crate::model::image::Image;
use crate::model::request::{RequestStatus, RequestType};
use crate::model::role::Role;
use crate::model::slide::{Slide, SlideAction, SlideControl};
use crate::models::{LoginReqDto, RegisterReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{openapi, Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AirClass API",
        version = "1.0.0",
        description = r#"
## AirClass classroom attendance API

Teachers open classrooms and issue short-lived attendance codes; students
redeem those codes to mark attendance exactly once per classroom per day.
Sessions auto-close once every eligible student has redeemed them.

### 🔹 Key Features
- **Attendance codes**
  - Issue time-limited 6-character codes, redeem under concurrent access
- **Classroom Management**
  - Create, list, update and delete classrooms
- **Slides & Selfies**
  - Slide metadata, slide-control events and selfie uploads
- **In-class Requests**
  - Students raise questions; teachers resolve them

### 🔐 Security
All endpoints except `/auth/*` require **JWT Bearer authentication**.
Codes can only be issued by **Teacher** or **Admin** roles and redeemed by
**Student** accounts.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::issue_code,
        crate::api::attendance::mark_attendance,
        crate::api::attendance::list_attendance,

        crate::api::classroom::list_classrooms,
        crate::api::classroom::create_classroom,
        crate::api::classroom::update_classroom,
        crate::api::classroom::delete_classroom,

        crate::api::slide::list_slides,
        crate::api::slide::create_slide,
        crate::api::slide::list_slide_controls,
        crate::api::slide::create_slide_control,

        crate::api::image::list_images,
        crate::api::image::create_image,

        crate::api::request::list_requests,
        crate::api::request::create_request,
        crate::api::request::update_request,
        crate::api::request::delete_request,
    ),
    components(
        schemas(
            IssueCodeReq,
            MarkAttendanceReq,
            IssuedSession,
            Redeemed,
            AttendanceListRow,
            AttendanceListResponse,
            CreateClassroom,
            UpdateClassroom,
            ClassroomRow,
            CreateSlide,
            CreateSlideControl,
            Slide,
            SlideControl,
            SlideAction,
            CreateImage,
            Image,
            CreateRequest,
            UpdateRequest,
            RequestRow,
            RequestType,
            RequestStatus,
            Role,
            RegisterReq,
            LoginReqDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance code issuance and redemption"),
        (name = "Classroom", description = "Classroom management APIs"),
        (name = "Slide", description = "Slide metadata and control APIs"),
        (name = "Image", description = "Selfie image APIs"),
        (name = "Request", description = "In-class request APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
