use mediacore::{ImageRequest, TtsRequest, VideoRequest, WorkflowDefinition, WorkflowStep};

/// Built-in example workflows offered to clients as starting points
pub fn sample_workflows() -> Vec<WorkflowDefinition> {
    vec![
        WorkflowDefinition::new("simple_tts", "Simple text to speech")
            .with_description("Convert a sentence to speech")
            .with_step(
                WorkflowStep::new(
                    "tts_step",
                    TtsRequest::new("Hello, this is a test of the text-to-speech system.")
                        .with_voice("Kore"),
                )
                .with_output_key("audio"),
            ),
        WorkflowDefinition::new("image_generation", "Image generation")
            .with_description("Generate an image from a prompt")
            .with_step(
                WorkflowStep::new("imagen_step", {
                    let mut request = ImageRequest::new("A beautiful sunset over a mountain lake")
                        .with_aspect_ratio("16:9");
                    request.sample_count = Some(1);
                    request
                })
                .with_output_key("image"),
            ),
        WorkflowDefinition::new("video_generation", "Video generation")
            .with_description("Generate a video from a prompt")
            .with_step(
                WorkflowStep::new(
                    "veo_step",
                    VideoRequest::new("A cat playing with a ball of yarn")
                        .with_aspect_ratio("16:9")
                        .with_duration(5),
                )
                .with_output_key("video"),
            ),
        WorkflowDefinition::new("complex_workflow", "Image with narration")
            .with_description("Generate an image, then a spoken description of it")
            .with_step(
                WorkflowStep::new(
                    "generate_image",
                    ImageRequest::new("A futuristic city with flying cars").with_aspect_ratio("16:9"),
                )
                .with_output_key("generated_image"),
            )
            .with_step(
                WorkflowStep::new(
                    "describe_image",
                    TtsRequest::new("This is a futuristic city with flying cars and neon lights.")
                        .with_voice("Kore"),
                )
                .depends_on("generate_image")
                .with_output_key("description_audio"),
            ),
    ]
}

pub fn find_template(id: &str) -> Option<WorkflowDefinition> {
    sample_workflows().into_iter().find(|t| t.id == id)
}
