pub const ROOT: &str = "/";

pub const SIGNUP: &str = "/galleryitems/signup";
pub const LOGIN: &str = "/galleryitems/login";
pub const AUTH_VALIDATE: &str = "/auth/validate";

pub const GALLERY_ITEMS: &str = "/galleryitems";
pub const GALLERY_ITEMS_USER: &str = "/galleryitems/:user_name";
pub const GALLERY_ADD: &str = "/galleryitems/add";
pub const GALLERY_DELETE: &str = "/galleryitems/delete/:user_name/:item_id";

pub const POST_ADD: &str = "/post/add";
pub const POST_ALL: &str = "/post/all";
pub const POSTS_RECENTS: &str = "/posts/recents";
pub const POSTS_NEARBY: &str = "/posts/nearby";
pub const POSTS_DELETE: &str = "/posts/delete/:user_name/:item_id";
