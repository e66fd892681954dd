#![deny(clippy::all, clippy::pedantic)]

use folio_api_types::{
    BlogListQuery, BlogListResponse, BlogPost, BlogPostPatch, DeleteResponse, RelatedResponse,
};
use reqwest::Method;

use crate::args::{DraftArgs, PostsCmd};
use crate::client::{CliError, Ctx};
use crate::editor::{Draft, Editor};
use crate::handlers::browse;
use crate::io::{read_opt_value, to_value};
use crate::print::print_json;
use crate::upload::{ImageSlot, upload_image};

pub async fn handle(ctx: &Ctx, cmd: PostsCmd) -> Result<(), CliError> {
    match cmd {
        PostsCmd::List {
            page,
            limit,
            tag,
            search,
            drafts,
        } => {
            let query = BlogListQuery {
                page,
                limit,
                tag,
                search,
                published: (!drafts).then_some(true),
            };
            list(ctx, &query, drafts).await
        }
        PostsCmd::Browse { limit, drafts } => browse::run(ctx, limit, drafts).await,
        PostsCmd::Get { slug } => get(ctx, &slug).await,
        PostsCmd::Related { slug, limit } => related(ctx, &slug, limit).await,
        PostsCmd::Create(args) => create(ctx, *args).await,
        PostsCmd::Edit { slug, draft } => edit(ctx, &slug, *draft).await,
        PostsCmd::Publish { slug } => set_published(ctx, &slug, true).await,
        PostsCmd::Unpublish { slug } => set_published(ctx, &slug, false).await,
        PostsCmd::Delete { slug } => delete(ctx, &slug).await,
    }
}

pub fn list_query_pairs(query: &BlogListQuery) -> Vec<(&'static str, String)> {
    let mut q = Vec::new();
    if let Some(page) = query.page {
        q.push(("page", page.to_string()));
    }
    if let Some(limit) = query.limit {
        q.push(("limit", limit.to_string()));
    }
    if let Some(tag) = &query.tag {
        q.push(("tag", tag.clone()));
    }
    if let Some(search) = &query.search {
        q.push(("search", search.clone()));
    }
    if let Some(published) = query.published {
        q.push(("published", published.to_string()));
    }
    q
}

pub async fn fetch_page(ctx: &Ctx, query: &BlogListQuery) -> Result<BlogListResponse, CliError> {
    let q = list_query_pairs(query);
    ctx.request(Method::GET, "api/blogs", Some(&q), None).await
}

async fn list(ctx: &Ctx, query: &BlogListQuery, drafts: bool) -> Result<(), CliError> {
    if drafts {
        ctx.require_admin()?;
    }
    let res = fetch_page(ctx, query).await?;
    print_json(&res)?;
    Ok(())
}

async fn get(ctx: &Ctx, slug: &str) -> Result<(), CliError> {
    let path = format!("api/blogs/{slug}");
    let res: BlogPost = ctx.request(Method::GET, &path, None, None).await?;
    print_json(&res)?;
    Ok(())
}

async fn related(ctx: &Ctx, slug: &str, limit: Option<u32>) -> Result<(), CliError> {
    let path = format!("api/blogs/{slug}/related");
    let q: Vec<(&str, String)> = limit
        .map(|limit| vec![("limit", limit.to_string())])
        .unwrap_or_default();
    let res: RelatedResponse = ctx.request(Method::GET, &path, Some(&q), None).await?;
    print_json(&res)?;
    Ok(())
}

async fn create(ctx: &Ctx, args: DraftArgs) -> Result<(), CliError> {
    ctx.require_admin()?;
    let mut editor = Editor::create();
    apply_draft_args(ctx, editor.draft_mut(), args).await?;
    save(ctx, editor).await
}

async fn edit(ctx: &Ctx, slug: &str, args: DraftArgs) -> Result<(), CliError> {
    ctx.require_admin()?;
    let path = format!("api/blogs/{slug}");
    let post: BlogPost = ctx.request(Method::GET, &path, None, None).await?;
    let mut editor = Editor::edit(&post);
    apply_draft_args(ctx, editor.draft_mut(), args).await?;
    save(ctx, editor).await
}

async fn save(ctx: &Ctx, editor: Editor) -> Result<(), CliError> {
    let saved = editor.submit(ctx).await?;
    eprintln!("{}", saved.message);
    let post = saved.close().await;
    print_json(&post)?;
    Ok(())
}

/// Applies command-line edits to a draft. Local image files are uploaded
/// first and their URLs placed in the matching slot.
pub async fn apply_draft_args(
    ctx: &Ctx,
    draft: &mut Draft,
    args: DraftArgs,
) -> Result<(), CliError> {
    let DraftArgs {
        title,
        content,
        content_file,
        excerpt,
        author,
        published,
        tags,
        remove_tags,
        keywords,
        remove_keywords,
        featured_image,
        clear_featured_image,
        images,
        remove_images,
        seo_title,
        seo_description,
    } = args;

    if let Some(title) = title {
        draft.set_title(title);
    }
    if let Some(content) = read_opt_value(content, content_file)? {
        draft.set_content(content);
    }
    if let Some(excerpt) = excerpt {
        draft.set_excerpt(excerpt);
    }
    if let Some(author) = author {
        draft.set_author(author);
    }
    if let Some(published) = published {
        draft.set_published(published);
    }
    if seo_title.is_some() {
        draft.set_seo_title(seo_title);
    }
    if seo_description.is_some() {
        draft.set_seo_description(seo_description);
    }

    for tag in &remove_tags {
        draft.remove_tag(tag);
    }
    for tag in &tags {
        draft.add_tag(tag);
    }
    for keyword in &remove_keywords {
        draft.remove_keyword(keyword);
    }
    for keyword in &keywords {
        draft.add_keyword(keyword);
    }

    if clear_featured_image {
        draft.clear_featured_image();
    }
    if let Some(path) = featured_image {
        let uploaded = upload_image(ctx, &path).await?;
        draft.place_image(ImageSlot::Featured, uploaded.url);
    }
    for url in &remove_images {
        draft.remove_gallery_image(url);
    }
    for path in &images {
        let uploaded = upload_image(ctx, path).await?;
        draft.place_image(ImageSlot::Gallery, uploaded.url);
    }
    Ok(())
}

async fn set_published(ctx: &Ctx, slug: &str, published: bool) -> Result<(), CliError> {
    ctx.require_admin()?;
    let path = format!("api/blogs/{slug}");
    let body = to_value(BlogPostPatch::publish(published))?;
    let res: BlogPost = ctx.request(Method::PUT, &path, None, Some(body)).await?;
    print_json(&res)?;
    Ok(())
}

async fn delete(ctx: &Ctx, slug: &str) -> Result<(), CliError> {
    ctx.require_admin()?;
    let path = format!("api/blogs/{slug}");
    let res: DeleteResponse = ctx.request(Method::DELETE, &path, None, None).await?;
    println!("{}", res.message);
    Ok(())
}
