//! COCO class vocabulary used by the on-device model

pub const COCO_CLASSES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Position of `label` in the vocabulary
pub fn class_index(label: &str) -> Option<usize> {
    COCO_CLASSES.iter().position(|c| *c == label)
}

/// Label for a class id; ids past the vocabulary become `class_<id>`
pub fn class_label(classes: &[&str], class_id: usize) -> String {
    classes
        .get(class_id)
        .map(|c| c.to_string())
        .unwrap_or_else(|| format!("class_{class_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(class_index("person"), Some(0));
        assert_eq!(class_index("cell phone"), Some(67));
        assert_eq!(class_index("toothbrush"), Some(79));
        assert_eq!(class_index("unicorn"), None);
        assert_eq!(class_label(&COCO_CLASSES, 2), "car");
        assert_eq!(class_label(&COCO_CLASSES, 80), "class_80");
    }
}
